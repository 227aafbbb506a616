// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use rawdiff::config::ClientConfig;
use rawdiff::http::ResilientClient;
use simple_logger::SimpleLogger;
use std::sync::Once;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static LOGGER: Once = Once::new();

/// Installs a logger once per test binary. `RUST_LOG` overrides the level.
pub fn init_logging() {
    LOGGER.call_once(|| {
        let _ = SimpleLogger::new()
            .with_level(log::LevelFilter::Warn)
            .env()
            .init();
    });
}

pub async fn setup_mock_server() -> MockServer {
    init_logging();
    MockServer::start().await
}

/// Mounts a GET handler for `route`.
pub async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Short timeouts, no retries, redirects left to the caller.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new();
    config.set_follow_redirect(false);
    config.set_dial_timeout(Duration::from_secs(2));
    config.set_total_timeout(Duration::from_secs(5));
    config
}

pub fn client(config: ClientConfig) -> ResilientClient {
    ResilientClient::new(config).expect("client should build")
}

pub fn html_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body, "text/html")
}
