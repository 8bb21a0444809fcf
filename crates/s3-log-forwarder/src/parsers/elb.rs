// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Classic Elastic Load Balancer access logs.
//!
//! ```text
//! timestamp elb client:port backend:port request_processing_time backend_processing_time
//! response_processing_time elb_status_code backend_status_code received_bytes sent_bytes
//! "request" "user_agent" ssl_cipher ssl_protocol
//! ```
//!
//! There is no per-line tolerance here: the first short line fails the object.

use serde::Serialize;

use super::tokenizer::{split_host_port, MissingField, Row, Tokenizer};
use super::{Entry, ParseError, Record};

/// The path is searched for past `scheme://h`, so the slashes of the scheme
/// are never taken as the start of the path.
const PATH_SEARCH_OFFSET: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElbRecord {
    pub timestamp: String,
    pub elb_name: String,
    pub client_ip: String,
    pub backend_ip: String,
    pub request_processing_time: String,
    pub backend_processing_time: String,
    pub response_processing_time: String,
    pub elb_status_code: String,
    pub backend_status_code: String,
    pub received_bytes: String,
    pub sent_bytes: String,
    pub method: String,
    pub url: String,
    pub user_agent: String,
    pub ssl_cipher: String,
    pub ssl_protocol: String,
}

pub fn records(text: &str) -> impl Iterator<Item = Result<Entry, ParseError>> + '_ {
    let tokenizer = Tokenizer::space_delimited();
    text.lines().enumerate().map(move |(index, line)| {
        let number = index + 1;
        let row = tokenizer
            .split(line)
            .map_err(|source| ParseError::Tokenize {
                line: number,
                source,
            })?;
        let record = parse_row(&row).map_err(|MissingField(field)| ParseError::MissingField {
            line: number,
            field,
        })?;
        Ok(Entry::Record(Record::Elb(record)))
    })
}

fn parse_row(row: &Row) -> Result<ElbRecord, MissingField> {
    let request: Vec<&str> = row.get(11, "request")?.split(' ').collect();
    let method = request.first().copied().unwrap_or_default();
    let url = request.get(1).copied().ok_or(MissingField("url"))?;

    Ok(ElbRecord {
        timestamp: row.owned(0, "timestamp")?,
        elb_name: row.owned(1, "elb_name")?,
        client_ip: split_host_port(row.get(2, "client")?).0.to_string(),
        backend_ip: split_host_port(row.get(3, "backend")?).0.to_string(),
        request_processing_time: row.owned(4, "request_processing_time")?,
        backend_processing_time: row.owned(5, "backend_processing_time")?,
        response_processing_time: row.owned(6, "response_processing_time")?,
        elb_status_code: row.owned(7, "elb_status_code")?,
        backend_status_code: row.owned(8, "backend_status_code")?,
        received_bytes: row.owned(9, "received_bytes")?,
        sent_bytes: row.owned(10, "sent_bytes")?,
        method: method.to_string(),
        url: request_path(url).to_string(),
        user_agent: row.owned(12, "user_agent")?,
        ssl_cipher: row.owned(13, "ssl_cipher")?,
        ssl_protocol: row.owned(14, "ssl_protocol")?,
    })
}

/// `https://example.com:443/a?b` -> `/a?b`. A URL without a path is kept whole.
fn request_path(url: &str) -> &str {
    url.get(PATH_SEARCH_OFFSET..)
        .and_then(|tail| tail.find('/'))
        .and_then(|idx| url.get(PATH_SEARCH_OFFSET + idx..))
        .unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"2015-05-13T23:39:43.945958Z my-loadbalancer 192.168.131.39:2817 10.0.0.1:80 0.000073 0.001048 0.000057 200 200 0 29 "GET http://www.example.com:80/index.html?page=1 HTTP/1.1" "curl/7.38.0" - -"#;

    fn parse_all(text: &str) -> Vec<Result<Entry, ParseError>> {
        records(text).collect()
    }

    #[test]
    fn test_parse_line() {
        let entries = parse_all(LINE);
        assert_eq!(entries.len(), 1);
        let Ok(Entry::Record(Record::Elb(record))) = &entries[0] else {
            panic!("expected an ELB record, got {:?}", entries[0]);
        };
        assert_eq!(record.timestamp, "2015-05-13T23:39:43.945958Z");
        assert_eq!(record.elb_name, "my-loadbalancer");
        assert_eq!(record.client_ip, "192.168.131.39");
        assert_eq!(record.backend_ip, "10.0.0.1");
        assert_eq!(record.request_processing_time, "0.000073");
        assert_eq!(record.backend_processing_time, "0.001048");
        assert_eq!(record.response_processing_time, "0.000057");
        assert_eq!(record.elb_status_code, "200");
        assert_eq!(record.backend_status_code, "200");
        assert_eq!(record.received_bytes, "0");
        assert_eq!(record.sent_bytes, "29");
        assert_eq!(record.method, "GET");
        assert_eq!(record.url, "/index.html?page=1");
        assert_eq!(record.user_agent, "curl/7.38.0");
        assert_eq!(record.ssl_cipher, "-");
        assert_eq!(record.ssl_protocol, "-");
    }

    #[test]
    fn test_json_field_order() {
        let entries = parse_all(LINE);
        let Ok(Entry::Record(record)) = &entries[0] else {
            panic!("expected a record");
        };
        let payload = record.payload().unwrap();
        assert!(payload.starts_with(
            r#"{"timestamp":"2015-05-13T23:39:43.945958Z","elb_name":"my-loadbalancer","client_ip":"192.168.131.39""#
        ));
        assert!(payload.ends_with(r#""ssl_cipher":"-","ssl_protocol":"-"}"#));
    }

    #[test]
    fn test_short_line_fails() {
        let text = format!("{LINE}\n2015-05-13T23:39:43.945958Z my-loadbalancer");
        let entries = parse_all(&text);
        assert!(entries[0].is_ok());
        assert!(matches!(
            entries[1],
            Err(ParseError::MissingField {
                line: 2,
                field: "request"
            })
        ));
    }

    #[test]
    fn test_empty_line_fails() {
        let text = format!("{LINE}\n\n{LINE}");
        let entries = parse_all(&text);
        assert!(matches!(entries[1], Err(ParseError::MissingField { line: 2, .. })));
    }

    #[test]
    fn test_request_without_url_fails() {
        let line = LINE.replace(
            "\"GET http://www.example.com:80/index.html?page=1 HTTP/1.1\"",
            "\"-\"",
        );
        assert!(matches!(
            parse_all(&line)[0],
            Err(ParseError::MissingField { field: "url", .. })
        ));
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("https://www.example.com:443/"), "/");
        assert_eq!(request_path("http://example.com/a/b?c=d"), "/a/b?c=d");
        assert_eq!(request_path("http://example.com"), "http://example.com");
        assert_eq!(request_path("/short"), "/short");
    }
}
