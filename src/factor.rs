// File: factor.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::Serialize;

/// A dimension along which two responses are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Factor {
    StatusCode,
    ContentLength,
    ContentType,
    Location,
    Header,
    HeaderValue,
    Cookie,
}

impl Factor {
    /// Evaluation order of a comparison.
    pub const ALL: [Factor; 7] = [
        Factor::StatusCode,
        Factor::ContentLength,
        Factor::ContentType,
        Factor::Location,
        Factor::Header,
        Factor::HeaderValue,
        Factor::Cookie,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::StatusCode => "StatusCode",
            Factor::ContentLength => "ContentLength",
            Factor::ContentType => "ContentType",
            Factor::Location => "Location",
            Factor::Header => "Header",
            Factor::HeaderValue => "HeaderValue",
            Factor::Cookie => "Cookie",
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected difference.
///
/// Set-style factors leave `old` empty and put an annotated line per added
/// or removed entry in `new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub factor: Factor,
    pub old: String,
    pub new: String,
}

impl Change {
    pub fn new(factor: Factor, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            factor,
            old: old.into(),
            new: new.into(),
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.old.is_empty() {
            write!(f, "{}:\n{}", self.factor, self.new.trim_end())
        } else {
            write!(f, "{}: {} -> {}", self.factor, self.old, self.new)
        }
    }
}
