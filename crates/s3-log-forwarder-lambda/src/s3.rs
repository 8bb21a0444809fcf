// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use s3_log_forwarder::store::FetchError;
use s3_log_forwarder::{ObjectLocation, ObjectStore};
use tokio::runtime::Handle;
use tracing::debug;

/// Reads objects through the AWS SDK from a blocking thread.
///
/// `get` drives the SDK future on `handle`, so it must be called from a
/// thread the runtime does not poll (e.g. inside `spawn_blocking`).
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    handle: Handle,
}

impl S3ObjectStore {
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        let output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| {
                FetchError::new(
                    &location.bucket,
                    &location.key,
                    DisplayErrorContext(e).to_string(),
                )
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| FetchError::new(&location.bucket, &location.key, e))?;

        let bytes = body.into_bytes();
        debug!("Read {} bytes from {location}", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl ObjectStore for S3ObjectStore {
    fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        self.handle.block_on(self.fetch(location))
    }
}
