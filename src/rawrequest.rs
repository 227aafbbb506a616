// File: rawrequest.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::error::{ClientError, ClientResult, ParseError, ParseResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, HOST};
use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

pub const DEFAULT_SCHEME: &str = "https";

/// Headers regenerated by the transport and therefore never stored.
pub const FORBIDDEN_HEADERS: [&str; 4] =
    ["connection", "content-length", "transfer-encoding", "trailer"];

pub fn is_forbidden_header(name: &str) -> bool {
    FORBIDDEN_HEADERS
        .iter()
        .any(|forbidden| forbidden.eq_ignore_ascii_case(name.trim()))
}

/// A raw HTTP request kept in editable form so single fields can be fuzzed
/// and the request re-serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestModel {
    scheme: String,
    verb: String,
    path: String,
    host: String,
    host_override: Option<String>,
    params: BTreeMap<String, Vec<String>>,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    content_type: Option<String>,
    body: String,
    has_body: bool,
}

impl RequestModel {
    /// Builds a bodiless request for `url`.
    pub fn new(verb: &str, url: &str) -> ParseResult<Self> {
        let parsed = Url::parse(url).map_err(|e| ParseError::InvalidUrl(format!("{}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ParseError::InvalidUrl(format!("{}: no host", url)))?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            verb: verb.to_string(),
            path,
            host,
            host_override: None,
            params: collect_params(&parsed),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            content_type: None,
            body: String::new(),
            has_body: false,
        })
    }

    pub fn parse(text: &str) -> ParseResult<Self> {
        Self::parse_with_host(text, None)
    }

    pub fn parse_bytes(bytes: &[u8]) -> ParseResult<Self> {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    /// Parses `text`, resolving the url against `host_override` instead of
    /// the Host header when one is given.
    pub fn parse_with_host(text: &str, host_override: Option<&str>) -> ParseResult<Self> {
        let normalized = text.replace('\r', "");
        let (head, body) = match normalized.split_once("\n\n") {
            Some((head, body)) => (head, body.trim()),
            None => (normalized.as_str(), ""),
        };

        let mut lines = head.trim().split('\n').filter(|line| !line.trim().is_empty());

        let request_line = lines.next().unwrap_or_default();
        if !request_line.contains("HTTP") {
            return Err(ParseError::MalformedRequestLine(request_line.to_string()));
        }
        let fields: Vec<&str> = request_line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(ParseError::MalformedRequestLine(request_line.to_string()));
        }

        let host = lines
            .next()
            .and_then(|line| line.split_once(':'))
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case("host"))
            .map(|(_, value)| value.trim().to_string())
            .ok_or(ParseError::MissingHostHeader)?;

        let mut request = Self {
            scheme: DEFAULT_SCHEME.to_string(),
            verb: fields[0].to_string(),
            path: fields[1].to_string(),
            host,
            host_override: host_override
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            content_type: None,
            body: body.to_string(),
            has_body: !body.is_empty(),
        };

        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedHeader(line.trim().to_string()))?;
            request.store_header(name, value.trim());
        }

        request.params = collect_params(&request.base_url()?);
        Ok(request)
    }

    fn store_header(&mut self, name: &str, value: &str) {
        let key = name.trim().to_ascii_lowercase();
        if is_forbidden_header(&key) {
            return;
        }

        match key.as_str() {
            "host" => self.host = value.to_string(),
            "cookie" => self.cookies.extend(parse_cookie_header(value)),
            "content-type" => {
                self.content_type = Some(value.to_string());
                self.headers.insert(key, value.to_string());
            }
            _ => {
                self.headers.insert(key, value.to_string());
            }
        }
    }

    fn base_url(&self) -> ParseResult<Url> {
        let authority = self.effective_host();
        let base = format!("{}://{}", self.scheme, authority);
        Url::parse(&base)
            .and_then(|url| url.join(&self.path))
            .map_err(|e| ParseError::InvalidUrl(format!("{}{}: {}", base, self.path, e)))
    }

    /// The request url, with the query rebuilt from the current parameters.
    pub fn url(&self) -> ParseResult<Url> {
        let mut url = self.base_url()?;
        if self.params.is_empty() {
            url.set_query(None);
        } else {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, values) in &self.params {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    /// `name=value` pairs joined with `"; "`, or `None` without cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Serializes the model into a request for `client`.
    ///
    /// The Host header is set from the stored host rather than derived from
    /// the url, so a rewritten Host stays observable on the wire. The
    /// content-type override is applied last and replaces any stored value.
    pub fn to_request(&self, client: &reqwest::Client) -> ClientResult<reqwest::Request> {
        let url = self.url()?;
        let method = Method::from_bytes(self.verb.as_bytes())
            .map_err(|e| ClientError::InvalidRequest(format!("verb {:?}: {}", self.verb, e)))?;

        let mut headers = HeaderMap::new();
        if !self.host.is_empty() {
            headers.insert(HOST, header_value(&self.host)?);
        }
        if let Some(cookie) = self.cookie_header() {
            headers.insert(COOKIE, header_value(&cookie)?);
        }
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidRequest(format!("header {:?}: {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }
        if let Some(content_type) = &self.content_type {
            headers.insert(CONTENT_TYPE, header_value(content_type)?);
        }

        let mut builder = client.request(method, url).headers(headers);
        if self.has_body {
            builder = builder.body(self.body.clone());
        }
        builder
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))
    }

    pub fn effective_host(&self) -> &str {
        self.host_override.as_deref().unwrap_or(&self.host)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn set_scheme(&mut self, scheme: &str) {
        self.scheme = scheme.to_string();
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn set_verb(&mut self, verb: &str) {
        self.verb = verb.to_string();
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replaces the path and re-reads the query parameters from it.
    pub fn set_path(&mut self, path: &str) -> ParseResult<()> {
        let previous = std::mem::replace(&mut self.path, path.to_string());
        match self.base_url() {
            Ok(url) => {
                self.params = collect_params(&url);
                Ok(())
            }
            Err(e) => {
                self.path = previous;
                Err(e)
            }
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = host.trim().to_string();
    }

    pub fn host_override(&self) -> Option<&str> {
        self.host_override.as_deref()
    }

    pub fn set_host_override(&mut self, host_override: Option<&str>) {
        self.host_override = host_override
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
    }

    pub fn params(&self) -> &BTreeMap<String, Vec<String>> {
        &self.params
    }

    pub fn set_param(&mut self, key: &str, values: Vec<String>) {
        self.params.insert(key.to_string(), values);
    }

    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn remove_param(&mut self, key: &str) -> Option<Vec<String>> {
        self.params.remove(key)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Stores a header with the same rules the parser applies: forbidden
    /// names are dropped, `Host` and `Cookie` update their own fields.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.store_header(name, value.trim());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let key = name.trim().to_ascii_lowercase();
        if key == "content-type" {
            self.content_type = None;
        }
        self.headers.remove(&key)
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn remove_cookie(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: Option<&str>) {
        self.content_type = content_type.map(str::to_string);
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn has_body(&self) -> bool {
        self.has_body
    }

    pub fn set_body(&mut self, body: &str) {
        self.body = body.to_string();
        self.has_body = !body.is_empty();
    }

    pub fn clear_body(&mut self) {
        self.body.clear();
        self.has_body = false;
    }
}

fn header_value(value: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ClientError::InvalidRequest(format!("header value {:?}: {}", value, e)))
}

fn collect_params(url: &Url) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

/// Splits a `Cookie` header value into name/value pairs at the first `=`, so
/// values may contain `=`. Segments without `=` are dropped.
pub fn parse_cookie_header(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|segment| segment.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}
