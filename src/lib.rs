// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::new_without_default)]

pub mod comparer;
pub mod config;
pub mod error;
pub mod factor;
pub mod fanout;
pub mod getstate;
pub mod http;
pub mod rawrequest;
pub mod rawresponse;
#[cfg(test)]
mod rawresponse_tests;
pub mod report;

pub use comparer::{ComparisonConfig, FactorComparer};
pub use config::{BlacklistMode, ClientConfig, ResponsePolicy};
pub use error::{ClientError, CompareError, ParseError};
pub use factor::{Change, Factor};
pub use fanout::{FanOutComparer, FanOutResult};
pub use http::ResilientClient;
pub use rawrequest::RequestModel;
pub use rawresponse::ResponseModel;
