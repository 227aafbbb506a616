// File: error.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use thiserror::Error;

/// Errors raised while reading raw request or response text.
///
/// Request parsing is strict and fails on any of these. Response parsing only
/// fails on a broken status line; malformed header lines are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("missing Host header on the second line")]
    MissingHostHeader,
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("failed to build http transport: {0}")]
    Build(#[source] reqwest::Error),
    #[error("invalid proxy url {url:?}: {reason}")]
    InvalidProxy { url: String, reason: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ClientError {
    /// Sorts a transport failure into the timeout or the generic network track.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("missing response to compare")]
    MissingOperand,
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type ClientResult<T> = Result<T, ClientError>;
