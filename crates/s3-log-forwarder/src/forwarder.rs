// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwarding of one object, end to end.
//!
//! ```text
//! validate token -> connect -> fetch -> decode -> classify -> parse -> send each line -> close
//! ```
//!
//! The token is checked before anything touches the network or the object
//! store. Once connected, the channel is closed on every way out.

use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

use crate::channel::{Channel, Connector, Transport};
use crate::config::ForwarderConfig;
use crate::credential::Credential;
use crate::decode::decode;
use crate::dialect::{classify, LogDialect};
use crate::error::ForwardError;
use crate::parsers::{self, Entry, SkipReason};
use crate::store::{ObjectLocation, ObjectStore};

/// Counts for one forwarded object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardSummary {
    pub dialect: LogDialect,
    /// Entries the parser produced (records plus skipped lines)
    pub total: usize,
    /// Lines written to the intake
    pub sent: usize,
    /// Lines the dialect tolerated as unusable
    pub skipped: usize,
}

impl ForwardSummary {
    fn new(dialect: LogDialect) -> Self {
        Self {
            dialect,
            total: 0,
            sent: 0,
            skipped: 0,
        }
    }
}

pub struct Forwarder<C> {
    config: Arc<ForwarderConfig>,
    connector: C,
}

impl<C: Connector> Forwarder<C> {
    pub fn new(config: Arc<ForwarderConfig>, connector: C) -> Self {
        Self { config, connector }
    }

    /// Streams the object at `location` to the intake.
    ///
    /// Everything logged on the way is scoped to a `forward` span carrying the
    /// object's bucket and key.
    pub fn forward<S>(
        &self,
        store: &S,
        location: &ObjectLocation,
    ) -> Result<ForwardSummary, ForwardError>
    where
        S: ObjectStore + ?Sized,
    {
        let span = info_span!("forward", bucket = %location.bucket, key = %location.key);
        let _entered = span.enter();

        let credential = Credential::parse(&self.config.token).map_err(|e| {
            error!("Configured token is not valid: {e}. Exiting.");
            ForwardError::from(e)
        })?;

        let mut channel = self.connector.connect().map_err(|e| {
            error!("Failed to open channel: {e}");
            ForwardError::from(e)
        })?;

        let result = stream_object(&credential, &mut channel, store, location);

        let endpoint = channel.endpoint().to_string();
        debug!(
            "Wrote {} lines ({} bytes) to {endpoint}",
            channel.lines_sent(),
            channel.bytes_sent()
        );
        if let Err(e) = channel.close() {
            warn!("Failed to close channel to {endpoint}: {e}");
        }

        match result {
            Ok(summary) => {
                info!("Finished sending file={} to {endpoint}", location.key);
                Ok(summary)
            }
            Err(e) => {
                error!("Exception: {e}");
                Err(e)
            }
        }
    }
}

fn stream_object<T, S>(
    credential: &Credential,
    channel: &mut Channel<T>,
    store: &S,
    location: &ObjectLocation,
) -> Result<ForwardSummary, ForwardError>
where
    T: Transport,
    S: ObjectStore + ?Sized,
{
    let raw = store.get(location)?;
    info!("Fetched file {} from S3 bucket {}", location.key, location.bucket);

    let text = decode(raw, &location.key)?;
    info!("Total number of lines: {}", text.split('\n').count());

    let dialect = classify(&location.key);
    info!(
        "File={} is {dialect} log format. Sending to {}",
        location.key,
        channel.endpoint()
    );

    let mut summary = ForwardSummary::new(dialect);
    for entry in parsers::parse(dialect, &text)? {
        summary.total += 1;
        match entry? {
            Entry::Record(record) => {
                let line = credential.format_line(&record.payload()?);
                channel.send(&line)?;
                summary.sent += 1;
            }
            Entry::Skipped(reason) => {
                summary.skipped += 1;
                log_skipped(&reason);
            }
        }
    }

    if dialect == LogDialect::Alb {
        info!("[ALB logs] total run count: {}", summary.total);
        info!("[ALB logs] processed-and-sent run count: {}", summary.sent);
        info!("[ALB logs] bad run count: {}", summary.skipped);
    }
    Ok(summary)
}

fn log_skipped(reason: &SkipReason) {
    match reason {
        SkipReason::Malformed { line, field, text } => {
            info!("[ALB logs] bad log line {line} (no {field}): {text}");
        }
        SkipReason::ShortLine { line, fields } => {
            debug!("Skipping line {line} with {fields} fields");
        }
    }
}
