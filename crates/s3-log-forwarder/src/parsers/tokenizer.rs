// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Quote-aware field splitting for the line-oriented dialects.

use csv::ReaderBuilder;

/// Splits single lines on a delimiter, treating `"..."` as one field.
///
/// Each line is read on its own so an unbalanced quote cannot swallow the
/// lines after it.
pub(crate) struct Tokenizer {
    builder: ReaderBuilder,
}

impl Tokenizer {
    pub(crate) fn new(delimiter: u8) -> Self {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(delimiter)
            .quote(b'"')
            .double_quote(true)
            .has_headers(false)
            .flexible(true);
        Self { builder }
    }

    pub(crate) fn space_delimited() -> Self {
        Self::new(b' ')
    }

    pub(crate) fn tab_delimited() -> Self {
        Self::new(b'\t')
    }

    /// Fields of `line`; an empty line has none.
    pub(crate) fn split(&self, line: &str) -> Result<Row, csv::Error> {
        let mut reader = self.builder.from_reader(line.as_bytes());
        let fields = match reader.records().next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => Vec::new(),
        };
        Ok(Row { fields })
    }
}

/// Name of a positional field a line was too short (or malformed) to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MissingField(pub &'static str);

/// One tokenized line
#[derive(Debug)]
pub(crate) struct Row {
    pub fields: Vec<String>,
}

impl Row {
    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn get(&self, index: usize, name: &'static str) -> Result<&str, MissingField> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or(MissingField(name))
    }

    pub(crate) fn owned(&self, index: usize, name: &'static str) -> Result<String, MissingField> {
        self.get(index, name).map(str::to_string)
    }
}

/// `ip:port` split on the first colon; the port is absent when there is no colon.
pub(crate) fn split_host_port(token: &str) -> (&str, Option<&str>) {
    let mut parts = token.split(':');
    let host = parts.next().unwrap_or_default();
    (host, parts.next())
}
