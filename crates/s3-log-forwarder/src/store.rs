// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Object store boundary.

use percent_encoding::percent_decode_str;
use std::error::Error;
use std::fmt;

/// Bucket and key of the object to forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Builds a location from an S3 event notification, whose keys are
    /// form-encoded (`+` for space, `%XX` escapes).
    pub fn from_notification(bucket: &str, raw_key: &str) -> Self {
        let plus_decoded = raw_key.replace('+', " ");
        let key = percent_decode_str(&plus_decoded)
            .decode_utf8_lossy()
            .into_owned();
        Self::new(bucket, key)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch s3://{bucket}/{key}: {source}")]
pub struct FetchError {
    pub bucket: String,
    pub key: String,
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

impl FetchError {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            source: source.into(),
        }
    }
}

/// Source of object bytes. Implementations block until the whole object is read.
pub trait ObjectStore {
    fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        (**self).get(location)
    }
}
