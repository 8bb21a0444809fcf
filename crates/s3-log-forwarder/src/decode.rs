// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns the fetched object bytes into text.

use flate2::read::GzDecoder;
use std::io::Read;
use std::string::FromUtf8Error;

const GZIP_SUFFIX: &str = ".gz";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid gzip stream: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("object is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

pub fn is_compressed(key: &str) -> bool {
    key.ends_with(GZIP_SUFFIX)
}

/// Decodes a whole object into memory, inflating it first when `key` ends with `.gz`.
///
/// A zero-byte `.gz` object decodes to empty text.
pub fn decode(raw: Vec<u8>, key: &str) -> Result<String, DecodeError> {
    let bytes = if is_compressed(key) && !raw.is_empty() {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut inflated = Vec::new();
        decoder
            .read_to_end(&mut inflated)
            .map_err(DecodeError::Gzip)?;
        inflated
    } else {
        raw
    };
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use proptest::prelude::*;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_object() {
        let text = decode(b"line one\nline two\n".to_vec(), "logs/app.log").unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[test]
    fn test_gzip_object() {
        let text = decode(gzip("hello\n"), "logs/app.log.gz").unwrap();
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn test_gzip_suffix_is_case_sensitive() {
        let raw = gzip("hello");
        assert!(matches!(
            decode(raw, "logs/app.log.GZ"),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn test_empty_gzip_object() {
        assert_eq!(decode(Vec::new(), "logs/app.log.gz").unwrap(), "");
    }

    #[test]
    fn test_truncated_gzip() {
        let mut raw = gzip("hello\n");
        raw.truncate(4);
        assert!(matches!(
            decode(raw, "logs/app.log.gz"),
            Err(DecodeError::Gzip(_))
        ));
    }

    #[test]
    fn test_invalid_gzip() {
        assert!(matches!(
            decode(b"plain text".to_vec(), "logs/app.log.gz"),
            Err(DecodeError::Gzip(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            decode(vec![0x66, 0xff, 0xfe], "logs/app.log"),
            Err(DecodeError::Utf8(_))
        ));
        assert!(matches!(
            decode(
                {
                    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                    encoder.write_all(&[0xc3, 0x28]).unwrap();
                    encoder.finish().unwrap()
                },
                "logs/app.log.gz"
            ),
            Err(DecodeError::Utf8(_))
        ));
    }

    proptest! {
        #[test]
        fn gzip_round_trip(text in ".*") {
            prop_assert_eq!(decode(gzip(&text), "bucket/key.gz").unwrap(), text);
        }
    }
}
