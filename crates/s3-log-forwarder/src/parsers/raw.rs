// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Objects of unknown format are forwarded line by line.
//!
//! The text is split on `\n` only, so a final newline yields a last empty
//! line, which is forwarded like any other.

use super::{Entry, ParseError, Record};

pub fn records(text: &str) -> impl Iterator<Item = Result<Entry, ParseError>> + '_ {
    text.split('\n')
        .map(|line| Ok(Entry::Record(Record::Raw(line.to_string()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        records(text)
            .map(|entry| match entry {
                Ok(Entry::Record(Record::Raw(line))) => line,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_trailing_newline_keeps_empty_line() {
        assert_eq!(lines("alpha\nbeta\n"), vec!["alpha", "beta", ""]);
    }

    #[test]
    fn test_lines_are_untouched() {
        assert_eq!(
            lines("  indented\r\n\ttabbed \"quoted\""),
            vec!["  indented\r", "\ttabbed \"quoted\""]
        );
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(lines(""), vec![""]);
    }
}
