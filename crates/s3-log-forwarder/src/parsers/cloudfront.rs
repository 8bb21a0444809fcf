// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudFront standard (web distribution) access logs.
//!
//! Tab separated, with `#Version` / `#Fields` header lines. Lines with fewer
//! than [`MIN_FIELDS`] fields are skipped without being treated as errors.

use std::fmt;

use super::tokenizer::Tokenizer;
use super::{Entry, ParseError, Record, SkipReason};

pub const MIN_FIELDS: usize = 23;

/// Output names of the columns following `date` and `time`, in log order
pub const FIELD_NAMES: [&str; 21] = [
    "x_edge_location",
    "sc_bytes",
    "c_ip",
    "cs_method",
    "cs_host",
    "cs_uri_stem",
    "sc_status",
    "cs_referer",
    "cs_user_agent",
    "cs_uri_query",
    "cs_cookie",
    "x_edge_result_type",
    "x_edge_request_id",
    "x_host_header",
    "cs_protocol",
    "cs_bytes",
    "time_taken",
    "x_forwarded_for",
    "ssl_protocol",
    "ssl_cipher",
    "x_edge_response_result_type",
];

/// Rendered as `"<date>T<time>Z" x_edge_location="..." ... x_edge_response_result_type="..."`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudFrontRecord {
    pub date: String,
    pub time: String,
    /// One value per entry of [`FIELD_NAMES`]
    pub values: Vec<String>,
}

impl fmt::Display for CloudFrontRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}T{}Z\"", self.date, self.time)?;
        for (name, value) in FIELD_NAMES.iter().zip(&self.values) {
            write!(f, " {name}=\"{value}\"")?;
        }
        Ok(())
    }
}

pub fn records(text: &str) -> impl Iterator<Item = Result<Entry, ParseError>> + '_ {
    let tokenizer = Tokenizer::tab_delimited();
    text.lines().enumerate().map(move |(index, line)| {
        let number = index + 1;
        let mut row = tokenizer
            .split(line)
            .map_err(|source| ParseError::Tokenize {
                line: number,
                source,
            })?;
        if row.len() < MIN_FIELDS {
            return Ok(Entry::Skipped(SkipReason::ShortLine {
                line: number,
                fields: row.len(),
            }));
        }
        row.fields.truncate(MIN_FIELDS);
        let mut fields = row.fields.into_iter();
        let date = fields.next().unwrap_or_default();
        let time = fields.next().unwrap_or_default();
        Ok(Entry::Record(Record::CloudFront(CloudFrontRecord {
            date,
            time,
            values: fields.collect(),
        })))
    })
}
