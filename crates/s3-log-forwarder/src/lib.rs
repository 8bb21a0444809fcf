// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards AWS log objects to a TLS log intake.
//!
//! An object is fetched from the store, decompressed when its key says so,
//! classified into one of the known AWS log dialects, split into records and
//! streamed as `"<token> <payload>\n"` lines over a single TLS connection.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod channel;
pub mod config;
pub mod credential;
pub mod decode;
pub mod dialect;
pub mod error;
pub mod forwarder;
pub mod parsers;
pub mod store;

pub use config::ForwarderConfig;
pub use dialect::{classify, LogDialect};
pub use error::ForwardError;
pub use forwarder::{ForwardSummary, Forwarder};
pub use store::{ObjectLocation, ObjectStore};
