// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_DIAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_TOTAL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 100;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Soft-404 masking: responses whose measured body length matches are
/// reported with status 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlacklistMode {
    #[default]
    Disabled,
    Exact(usize),
    Range { min: usize, max: usize },
}

impl BlacklistMode {
    pub fn matches(&self, content_length: usize) -> bool {
        match *self {
            BlacklistMode::Disabled => false,
            BlacklistMode::Exact(value) => content_length == value,
            BlacklistMode::Range { min, max } => (min..=max).contains(&content_length),
        }
    }
}

/// Policy shared by the client retry loop and the response parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePolicy {
    honor_retry_after: bool,
    retry_on_server_error: bool,
    blacklist: BlacklistMode,
    store_full_body: bool,
}

impl ResponsePolicy {
    pub fn new() -> Self {
        Self {
            honor_retry_after: true,
            retry_on_server_error: false,
            blacklist: BlacklistMode::Disabled,
            store_full_body: true,
        }
    }

    pub fn set_honor_retry_after(&mut self, honor_retry_after: bool) {
        self.honor_retry_after = honor_retry_after;
    }

    pub fn honor_retry_after(&self) -> bool {
        self.honor_retry_after
    }

    pub fn set_retry_on_server_error(&mut self, retry_on_server_error: bool) {
        self.retry_on_server_error = retry_on_server_error;
    }

    pub fn retry_on_server_error(&self) -> bool {
        self.retry_on_server_error
    }

    pub fn set_blacklist(&mut self, blacklist: BlacklistMode) {
        self.blacklist = blacklist;
    }

    pub fn blacklist(&self) -> BlacklistMode {
        self.blacklist
    }

    pub fn set_store_full_body(&mut self, store_full_body: bool) {
        self.store_full_body = store_full_body;
    }

    pub fn store_full_body(&self) -> bool {
        self.store_full_body
    }
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    validate_certificate: bool,
    follow_redirect: bool,
    retry_count: u32,
    max_idle_per_host: usize,
    idle_timeout: Duration,
    dial_timeout: Duration,
    total_timeout: Duration,
    rate_limit_per_second: Option<NonZeroU32>,
    rate_limit_per_minute: Option<NonZeroU32>,
    proxy_url: Option<String>,
    policy: ResponsePolicy,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            validate_certificate: false,
            follow_redirect: true,
            retry_count: 0,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
            rate_limit_per_second: None,
            rate_limit_per_minute: None,
            proxy_url: None,
            policy: ResponsePolicy::new(),
        }
    }

    pub fn set_validate_certificate(&mut self, validate_certificate: bool) {
        self.validate_certificate = validate_certificate;
    }

    pub fn validate_certificate(&self) -> bool {
        self.validate_certificate
    }

    pub fn set_follow_redirect(&mut self, follow_redirect: bool) {
        self.follow_redirect = follow_redirect;
    }

    pub fn follow_redirect(&self) -> bool {
        self.follow_redirect
    }

    pub fn set_retry_count(&mut self, retry_count: u32) {
        self.retry_count = retry_count;
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn set_max_idle_per_host(&mut self, max_idle_per_host: usize) {
        self.max_idle_per_host = max_idle_per_host;
    }

    pub fn max_idle_per_host(&self) -> usize {
        self.max_idle_per_host
    }

    pub fn set_idle_timeout(&mut self, idle_timeout: Duration) {
        self.idle_timeout = idle_timeout;
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Clamped to [`MAX_DIAL_TIMEOUT`].
    pub fn set_dial_timeout(&mut self, dial_timeout: Duration) {
        self.dial_timeout = dial_timeout.min(MAX_DIAL_TIMEOUT);
    }

    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Clamped to [`MAX_TOTAL_TIMEOUT`].
    pub fn set_total_timeout(&mut self, total_timeout: Duration) {
        self.total_timeout = total_timeout.min(MAX_TOTAL_TIMEOUT);
    }

    pub fn total_timeout(&self) -> Duration {
        self.total_timeout
    }

    pub fn set_rate_limit_per_second(&mut self, rate: Option<NonZeroU32>) {
        self.rate_limit_per_second = rate;
    }

    pub fn rate_limit_per_second(&self) -> Option<NonZeroU32> {
        self.rate_limit_per_second
    }

    /// Takes precedence over the per-second limit when both are set.
    pub fn set_rate_limit_per_minute(&mut self, rate: Option<NonZeroU32>) {
        self.rate_limit_per_minute = rate;
    }

    pub fn rate_limit_per_minute(&self) -> Option<NonZeroU32> {
        self.rate_limit_per_minute
    }

    pub fn set_proxy_url(&mut self, proxy_url: Option<String>) {
        self.proxy_url = proxy_url.filter(|url| !url.trim().is_empty());
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    pub fn set_policy(&mut self, policy: ResponsePolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> &ResponsePolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut ResponsePolicy {
        &mut self.policy
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
