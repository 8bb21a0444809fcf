// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Application Load Balancer access logs.
//!
//! ```text
//! type timestamp elb client:port target:port request_processing_time target_processing_time
//! response_processing_time elb_status_code target_status_code received_bytes sent_bytes
//! "request" "user_agent" ssl_cipher ssl_protocol target_group_arn "trace_id" ...
//! ```
//!
//! Fields past `trace_id` are ignored. A line missing any of the fields above,
//! a client or target without a port, or a request that is not
//! `METHOD URL VERSION` is reported as [`SkipReason::Malformed`] and the
//! object carries on.

use serde::Serialize;

use super::tokenizer::{split_host_port, MissingField, Row, Tokenizer};
use super::{Entry, ParseError, Record, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub elb_id: String,
    pub client_ip: String,
    pub client_port: String,
    pub target_ip: String,
    pub target_port: String,
    pub request_processing_time: String,
    pub target_processing_time: String,
    pub response_processing_time: String,
    pub elb_status_code: String,
    pub target_status_code: String,
    pub received_bytes: String,
    pub sent_bytes: String,
    pub method: String,
    pub url: String,
    pub http_version: String,
    pub user_agent: String,
    pub ssl_cipher: String,
    pub ssl_protocol: String,
    pub target_group_arn: String,
    pub trace_id: String,
}

pub fn records(text: &str) -> impl Iterator<Item = Result<Entry, ParseError>> + '_ {
    let tokenizer = Tokenizer::space_delimited();
    text.lines().enumerate().map(move |(index, line)| {
        let number = index + 1;
        let entry = match tokenizer.split(line) {
            Ok(row) => match parse_row(&row) {
                Ok(record) => Entry::Record(Record::Alb(record)),
                Err(MissingField(field)) => malformed(number, field, line),
            },
            Err(_) => malformed(number, "line", line),
        };
        Ok(entry)
    })
}

fn malformed(line: usize, field: &'static str, text: &str) -> Entry {
    Entry::Skipped(SkipReason::Malformed {
        line,
        field,
        text: text.to_string(),
    })
}

fn parse_row(row: &Row) -> Result<AlbRecord, MissingField> {
    let request: Vec<&str> = row.get(12, "request")?.split(' ').collect();
    let (client_ip, client_port) = split_host_port(row.get(3, "client")?);
    let (target_ip, target_port) = split_host_port(row.get(4, "target")?);

    Ok(AlbRecord {
        kind: row.owned(0, "type")?,
        timestamp: row.owned(1, "timestamp")?,
        elb_id: row.owned(2, "elb")?,
        client_ip: client_ip.to_string(),
        client_port: client_port.ok_or(MissingField("client_port"))?.to_string(),
        target_ip: target_ip.to_string(),
        target_port: target_port.ok_or(MissingField("target_port"))?.to_string(),
        request_processing_time: row.owned(5, "request_processing_time")?,
        target_processing_time: row.owned(6, "target_processing_time")?,
        response_processing_time: row.owned(7, "response_processing_time")?,
        elb_status_code: row.owned(8, "elb_status_code")?,
        target_status_code: row.owned(9, "target_status_code")?,
        received_bytes: row.owned(10, "received_bytes")?,
        sent_bytes: row.owned(11, "sent_bytes")?,
        method: request.first().copied().unwrap_or_default().to_string(),
        url: request.get(1).ok_or(MissingField("url"))?.to_string(),
        http_version: request.get(2).ok_or(MissingField("http_version"))?.to_string(),
        user_agent: row.owned(13, "user_agent")?,
        ssl_cipher: row.owned(14, "ssl_cipher")?,
        ssl_protocol: row.owned(15, "ssl_protocol")?,
        target_group_arn: row.owned(16, "target_group_arn")?,
        trace_id: row.owned(17, "trace_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LINE: &str = r#"http 2018-07-02T22:23:00.186641Z app/my-loadbalancer/50dc6c495c0c9188 192.168.131.39:2817 10.0.0.1:80 0.000 0.001 0.000 200 200 34 366 "GET http://www.example.com:80/ HTTP/1.1" "curl/7.46.0" - - arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 "Root=1-58337262-36d228ad5d99923122bbe354" "-" "-" 0 2018-07-02T22:22:48.364000Z "forward" "-" "-" "10.0.0.1:80" "200" "-" "-""#;

    fn counts(text: &str) -> (usize, usize) {
        records(text).fold((0, 0), |(good, bad), entry| match entry {
            Ok(Entry::Record(_)) => (good + 1, bad),
            Ok(Entry::Skipped(_)) => (good, bad + 1),
            Err(e) => panic!("ALB parsing must not fail: {e}"),
        })
    }

    #[test]
    fn test_parse_line() {
        let entries: Vec<_> = records(LINE).collect();
        let Ok(Entry::Record(Record::Alb(record))) = &entries[0] else {
            panic!("expected an ALB record, got {:?}", entries[0]);
        };
        assert_eq!(record.kind, "http");
        assert_eq!(record.timestamp, "2018-07-02T22:23:00.186641Z");
        assert_eq!(record.elb_id, "app/my-loadbalancer/50dc6c495c0c9188");
        assert_eq!(record.client_ip, "192.168.131.39");
        assert_eq!(record.client_port, "2817");
        assert_eq!(record.target_ip, "10.0.0.1");
        assert_eq!(record.target_port, "80");
        assert_eq!(record.elb_status_code, "200");
        assert_eq!(record.target_status_code, "200");
        assert_eq!(record.received_bytes, "34");
        assert_eq!(record.sent_bytes, "366");
        assert_eq!(record.method, "GET");
        assert_eq!(record.url, "http://www.example.com:80/");
        assert_eq!(record.http_version, "HTTP/1.1");
        assert_eq!(record.user_agent, "curl/7.46.0");
        assert_eq!(
            record.target_group_arn,
            "arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067"
        );
        assert_eq!(record.trace_id, "Root=1-58337262-36d228ad5d99923122bbe354");
    }

    #[test]
    fn test_type_is_serialized_as_type() {
        let record = match records(LINE).next() {
            Some(Ok(Entry::Record(record))) => record,
            other => panic!("unexpected {other:?}"),
        };
        let payload = record.payload().unwrap();
        assert!(payload.starts_with(r#"{"type":"http","timestamp":"#));
        assert!(payload.contains(r#""client_port":"2817""#));
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let text = format!("{LINE}\ngarbage\n{LINE}");
        let entries: Vec<_> = records(&text).collect();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            &entries[1],
            Ok(Entry::Skipped(SkipReason::Malformed { line: 2, field: "request", text })) if text == "garbage"
        ));
        assert_eq!(counts(&text), (2, 1));
    }

    #[test]
    fn test_target_without_port_is_skipped() {
        // ALB writes "-" as target when the request never reached one
        let line = LINE.replacen("10.0.0.1:80", "-", 1);
        assert!(matches!(
            records(&line).next(),
            Some(Ok(Entry::Skipped(SkipReason::Malformed {
                field: "target_port",
                ..
            })))
        ));
    }

    #[test]
    fn test_truncated_line_is_skipped() {
        let line = LINE.split(" arn:").next().unwrap();
        assert!(matches!(
            records(line).next(),
            Some(Ok(Entry::Skipped(SkipReason::Malformed {
                field: "target_group_arn",
                ..
            })))
        ));
    }

    proptest! {
        #[test]
        fn good_plus_bad_equals_lines(
            lines in proptest::collection::vec(
                prop_oneof![
                    Just(LINE.to_string()),
                    "[a-z0-9 :]{1,40}".prop_filter("non-empty", |l| !l.trim().is_empty()),
                ],
                1..20,
            )
        ) {
            let text = lines.join("\n");
            let (good, bad) = counts(&text);
            prop_assert_eq!(good + bad, lines.len());
        }

        #[test]
        fn client_port_comes_from_fourth_field(port in 1u16..) {
            let line = LINE.replacen("192.168.131.39:2817", &format!("192.168.131.39:{port}"), 1);
            match records(&line).next() {
                Some(Ok(Entry::Record(Record::Alb(record)))) => {
                    prop_assert_eq!(record.client_port, port.to_string());
                }
                other => prop_assert!(false, "unexpected {:?}", other),
            };
        }
    }
}
