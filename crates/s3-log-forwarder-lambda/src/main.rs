// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod logger;
mod s3;

use aws_lambda_events::s3::S3Event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use s3_log_forwarder::channel::TlsConnector;
use s3_log_forwarder::{ForwardSummary, Forwarder, ForwarderConfig, ObjectLocation};

use crate::s3::S3ObjectStore;

struct Handler {
    forwarder: Forwarder<TlsConnector>,
    store: S3ObjectStore,
}

#[tokio::main]
pub async fn main() -> Result<(), Error> {
    let config = ForwarderConfig::from_env();
    let env_filter = log_filter(config.as_ref().ok());

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .event_format(logger::Formatter)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match config {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on forwarder startup: {e}");
            return Err(e.into());
        }
    };

    let connector = match TlsConnector::new(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("Error building TLS client configuration: {e}");
            return Err(e.into());
        }
    };
    info!("Forwarding to {}", connector.endpoint());

    let sdk_config = aws_config::load_from_env().await;
    let store = S3ObjectStore::new(
        aws_sdk_s3::Client::new(&sdk_config),
        tokio::runtime::Handle::current(),
    );

    let handler = Arc::new(Handler {
        forwarder: Forwarder::new(config, connector),
        store,
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<S3Event>| {
        let handler = Arc::clone(&handler);
        async move { handle(handler, event).await }
    }))
    .await
}

/// Filter directives for the configured level; `info` until a config loads.
fn log_filter(config: Option<&ForwarderConfig>) -> String {
    let log_level = config.map_or("info", |config| config.log_level.as_str());
    format!("h2=off,hyper=off,rustls=off,aws_smithy_runtime=off,aws_config=off,{log_level}")
}

async fn handle(handler: Arc<Handler>, event: LambdaEvent<S3Event>) -> Result<(), Error> {
    let Some(record) = event.payload.records.into_iter().next() else {
        error!("Notification {} carries no records", event.context.request_id);
        return Err("S3 notification carries no records".into());
    };
    let (Some(bucket), Some(key)) = (record.s3.bucket.name, record.s3.object.key) else {
        error!("Notification {} has no bucket or key", event.context.request_id);
        return Err("S3 notification has no bucket or key".into());
    };
    let location = ObjectLocation::from_notification(&bucket, &key);

    let summary: ForwardSummary = tokio::task::spawn_blocking(move || {
        handler.forwarder.forward(&handler.store, &location)
    })
    .await??;

    debug!(
        "Forwarded {} of {} {} records ({} skipped)",
        summary.sent, summary.total, summary.dialect, summary.skipped
    );
    Ok(())
}
