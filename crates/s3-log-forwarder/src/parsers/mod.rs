// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record parsers, one per log dialect.
//!
//! Every parser turns the decoded object into a lazy, single-pass sequence of
//! [`Entry`] values. A line a dialect tolerates as malformed comes out as
//! [`Entry::Skipped`]; a line that breaks the whole object comes out as a
//! [`ParseError`] and the caller stops there.
//!
//! | dialect      | unit            | short or malformed line            |
//! |--------------|-----------------|------------------------------------|
//! | ELB          | space-separated | error, aborts the object           |
//! | ALB          | space-separated | skipped and counted                |
//! | CloudFront   | tab-separated   | skipped silently (< 23 fields)     |
//! | CloudTrail   | JSON document   | invalid document aborts the object |
//! | Unrecognized | raw `\n` split  | never fails                        |

use serde::Serialize;
use serde_json::ser::Formatter;
use std::borrow::Cow;
use std::io::{self, Write};

use crate::dialect::LogDialect;

pub mod alb;
pub mod cloudfront;
pub mod cloudtrail;
pub mod elb;
pub mod raw;
mod tokenizer;

pub use alb::AlbRecord;
pub use cloudfront::CloudFrontRecord;
pub use elb::ElbRecord;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: missing field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: {source}")]
    Tokenize {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("invalid CloudTrail document: {0}")]
    CloudTrail(#[source] serde_json::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A normalized record, ready to be rendered as a wire payload
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Elb(ElbRecord),
    Alb(AlbRecord),
    CloudFront(CloudFrontRecord),
    /// One element of the CloudTrail `Records` array, untouched
    CloudTrail(serde_json::Value),
    /// A line of an unrecognized object, untouched
    Raw(String),
}

impl Record {
    /// The text sent after the token.
    pub fn payload(&self) -> Result<Cow<'_, str>, ParseError> {
        let payload = match self {
            Self::Elb(record) => to_ascii_json(record),
            Self::Alb(record) => to_ascii_json(record),
            Self::CloudTrail(event) => to_ascii_json(event),
            Self::CloudFront(record) => return Ok(Cow::Owned(record.to_string())),
            Self::Raw(line) => return Ok(Cow::Borrowed(line)),
        };
        payload.map(Cow::Owned).map_err(ParseError::Serialize)
    }
}

/// Compact JSON with every non-ASCII character written as `\uXXXX` UTF-16 units.
fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..index])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Why a line produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A load balancer line lacking a positional field
    Malformed {
        line: usize,
        field: &'static str,
        text: String,
    },
    /// A CloudFront header or truncated line
    ShortLine { line: usize, fields: usize },
}

/// Outcome of one unit of input
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Record(Record),
    Skipped(SkipReason),
}

/// Forward-only sequence of parsed entries
pub type Records<'a> = Box<dyn Iterator<Item = Result<Entry, ParseError>> + 'a>;

/// Selects the parser for `dialect`. Only CloudTrail reads its input eagerly,
/// so only CloudTrail can fail here.
pub fn parse(dialect: LogDialect, text: &str) -> Result<Records<'_>, ParseError> {
    let records: Records<'_> = match dialect {
        LogDialect::Elb => Box::new(elb::records(text)),
        LogDialect::Alb => Box::new(alb::records(text)),
        LogDialect::CloudFront => Box::new(cloudfront::records(text)),
        LogDialect::CloudTrail => Box::new(cloudtrail::records(text)?),
        LogDialect::Unrecognized => Box::new(raw::records(text)),
    };
    Ok(records)
}
