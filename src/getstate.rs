// File: getstate.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct GetState {
    total_requests: AtomicU64,
    retried_requests: AtomicU64,
    timeouts: AtomicU64,
    failed_requests: AtomicU64,
    server_errors: AtomicU64,
}

/// A point-in-time copy of [`GetState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub total_requests: u64,
    pub retried_requests: u64,
    pub timeouts: u64,
    pub failed_requests: u64,
    pub server_errors: u64,
}

impl GetState {
    pub fn new() -> GetState {
        GetState::default()
    }

    pub fn add_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_retry(&self) {
        self.retried_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_server_error(&self) {
        self.server_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn retried_requests(&self) -> u64 {
        self.retried_requests.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }

    pub fn server_errors(&self) -> u64 {
        self.server_errors.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            total_requests: self.total_requests(),
            retried_requests: self.retried_requests(),
            timeouts: self.timeouts(),
            failed_requests: self.failed_requests(),
            server_errors: self.server_errors(),
        }
    }
}
