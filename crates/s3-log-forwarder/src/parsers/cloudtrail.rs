// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudTrail log files: one JSON document with a top-level `Records` array.

use serde::Deserialize;

use super::{Entry, ParseError, Record};

#[derive(Debug, Deserialize)]
struct CloudTrailDocument {
    #[serde(rename = "Records")]
    records: Vec<serde_json::Value>,
}

/// Parses the whole document up front, then yields each event as is.
pub fn records(
    text: &str,
) -> Result<impl Iterator<Item = Result<Entry, ParseError>>, ParseError> {
    let document: CloudTrailDocument =
        serde_json::from_str(text).map_err(ParseError::CloudTrail)?;
    Ok(document
        .records
        .into_iter()
        .map(|event| Ok(Entry::Record(Record::CloudTrail(event)))))
}
