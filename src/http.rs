// File: http.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::{ClientConfig, MAX_DIAL_TIMEOUT, MAX_TOTAL_TIMEOUT};
use crate::error::{ClientError, ClientResult};
use crate::getstate::GetState;
use crate::rawrequest::RequestModel;
use crate::rawresponse::ResponseModel;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use log::{debug, trace, warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

pub const DIAL_TIMEOUT_STEP: Duration = Duration::from_secs(3);
pub const TOTAL_TIMEOUT_STEP: Duration = Duration::from_secs(10);

/// Progress of one logical request through its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub retries: u32,
    pub dial_timeout: Duration,
    pub total_timeout: Duration,
}

impl RetryState {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            retries: 0,
            dial_timeout: config.dial_timeout(),
            total_timeout: config.total_timeout(),
        }
    }

    /// Widens both timeouts by one step, never past their caps.
    pub fn escalate(&mut self) {
        self.dial_timeout = (self.dial_timeout + DIAL_TIMEOUT_STEP).min(MAX_DIAL_TIMEOUT);
        self.total_timeout = (self.total_timeout + TOTAL_TIMEOUT_STEP).min(MAX_TOTAL_TIMEOUT);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Return,
    Timeout,
    ServerError(Option<Duration>),
}

/// HTTP client with a shared rate limiter and failure-driven retries.
///
/// Clones share the connection pool, the limiter and the counters. Only the
/// first dispatch of a request waits on the limiter; retries do not.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    config: Arc<ClientConfig>,
    client: reqwest::Client,
    rate_limiter: Option<Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    state_ptr: Arc<GetState>,
}

impl ResilientClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = build_transport(&config, config.dial_timeout(), config.total_timeout())?;
        let rate_limiter = build_rate_limiter(&config);
        Ok(ResilientClient {
            config: Arc::new(config),
            client,
            rate_limiter,
            state_ptr: Arc::new(GetState::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &GetState {
        &self.state_ptr
    }

    /// The pooled transport, for building requests outside this client.
    pub fn transport(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn send(&self, request: &RequestModel) -> ClientResult<reqwest::Response> {
        let wire = request.to_request(&self.client)?;
        self.execute(wire).await
    }

    /// Sends `request` and normalizes the reply with the configured policy.
    pub async fn send_normalized(&self, request: &RequestModel) -> ClientResult<ResponseModel> {
        let response = self.send(request).await?;
        self.normalize(response).await
    }

    pub async fn get(&self, url: &str) -> ClientResult<reqwest::Response> {
        let request = self
            .client
            .get(url)
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        self.execute(request).await
    }

    pub async fn get_normalized(&self, url: &str) -> ClientResult<ResponseModel> {
        let response = self.get(url).await?;
        self.normalize(response).await
    }

    pub async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> ClientResult<reqwest::Response> {
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        self.execute(request).await
    }

    pub async fn normalize(&self, response: reqwest::Response) -> ClientResult<ResponseModel> {
        ResponseModel::from_response(response, self.config.policy()).await
    }

    /// Dispatches `request`, retrying per the configured policy.
    ///
    /// Timeouts are retried on a transport with widened timeouts. A 5xx
    /// other than 501 is retried immediately when `retry_on_server_error` is
    /// set, otherwise after the delay announced by `Retry-After`; without
    /// either the response is returned as is. Any other transport error ends
    /// the sequence at once.
    pub async fn execute(&self, request: reqwest::Request) -> ClientResult<reqwest::Response> {
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.until_ready().await;
        }
        self.state_ptr.add_request();
        trace!("Dispatching {} {}", request.method(), request.url());

        let retry_count = self.config.retry_count();
        let mut retry = RetryState::new(&self.config);
        let mut transport = self.client.clone();
        let mut outcome = self.dispatch(&transport, &request).await;

        loop {
            let step = self.next_step(&outcome);
            match step {
                Step::Return => return outcome,
                _ if retry.retries >= retry_count => {
                    if retry_count > 0 {
                        warn!(
                            "Giving up on {} {} after {} retries",
                            request.method(),
                            request.url(),
                            retry.retries
                        );
                    }
                    return outcome;
                }
                Step::Timeout => {
                    retry.escalate();
                    debug!(
                        "Timeout on {}, retrying with dial timeout {:?} and total timeout {:?}",
                        request.url(),
                        retry.dial_timeout,
                        retry.total_timeout
                    );
                    transport =
                        build_transport(&self.config, retry.dial_timeout, retry.total_timeout)?;
                }
                Step::ServerError(delay) => {
                    if let Some(delay) = delay {
                        debug!("Server error on {}, retrying after {:?}", request.url(), delay);
                        drop(outcome);
                        tokio::time::sleep(delay).await;
                    } else {
                        debug!("Server error on {}, retrying", request.url());
                    }
                }
            }

            retry.retries += 1;
            self.state_ptr.add_retry();
            outcome = self.dispatch(&transport, &request).await;
        }
    }

    fn next_step(&self, outcome: &ClientResult<reqwest::Response>) -> Step {
        match outcome {
            Err(ClientError::Timeout(_)) => Step::Timeout,
            Err(_) => Step::Return,
            Ok(response) if is_retryable_status(response.status()) => {
                let policy = self.config.policy();
                if policy.retry_on_server_error() {
                    Step::ServerError(None)
                } else if policy.honor_retry_after() {
                    retry_after(response.headers())
                        .map(|delay| Step::ServerError(Some(delay)))
                        .unwrap_or(Step::Return)
                } else {
                    Step::Return
                }
            }
            Ok(_) => Step::Return,
        }
    }

    async fn dispatch(
        &self,
        transport: &reqwest::Client,
        request: &reqwest::Request,
    ) -> ClientResult<reqwest::Response> {
        let attempt = request.try_clone().ok_or_else(|| {
            ClientError::InvalidRequest("request body cannot be replayed".to_string())
        })?;

        match transport.execute(attempt).await {
            Ok(response) => {
                if is_retryable_status(response.status()) {
                    self.state_ptr.add_server_error();
                }
                Ok(response)
            }
            Err(e) => {
                let error = ClientError::from_transport(e);
                if error.is_timeout() {
                    self.state_ptr.add_timeout();
                } else {
                    self.state_ptr.add_failure();
                }
                Err(error)
            }
        }
    }
}

/// 5xx responses other than 501, which marks an intentionally unimplemented
/// method.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.as_u16() >= 500 && status != StatusCode::NOT_IMPLEMENTED
}

/// `Retry-After` given in whole seconds. HTTP dates are not honored.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn build_transport(
    config: &ClientConfig,
    dial_timeout: Duration,
    total_timeout: Duration,
) -> ClientResult<reqwest::Client> {
    let redirect = if config.follow_redirect() {
        Policy::default()
    } else {
        Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.validate_certificate())
        .pool_max_idle_per_host(config.max_idle_per_host())
        .pool_idle_timeout(config.idle_timeout())
        .connect_timeout(dial_timeout)
        .timeout(total_timeout)
        .redirect(redirect);

    if let Some(proxy_url) = config.proxy_url() {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| ClientError::InvalidProxy {
            url: proxy_url.to_string(),
            reason: e.to_string(),
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(ClientError::Build)
}

fn build_rate_limiter(
    config: &ClientConfig,
) -> Option<Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>> {
    let quota = match (config.rate_limit_per_minute(), config.rate_limit_per_second()) {
        (Some(per_minute), _) => Quota::per_minute(per_minute),
        (None, Some(per_second)) => Quota::per_second(per_second),
        (None, None) => return None,
    };
    Some(Arc::new(RateLimiter::direct(quota)))
}
