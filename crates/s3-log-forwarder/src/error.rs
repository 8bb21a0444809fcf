// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::channel::{ConnectionError, SendError};
use crate::credential::CredentialError;
use crate::decode::DecodeError;
use crate::parsers::ParseError;
use crate::store::FetchError;

/// Errors that abort forwarding a single object
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] CredentialError),

    #[error("Failed to connect to log intake: {0}")]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to decode object: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to parse object: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to send to log intake: {0}")]
    Send(#[from] SendError),
}
