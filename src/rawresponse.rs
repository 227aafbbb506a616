// File: rawresponse.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ResponsePolicy;
use crate::error::{ClientError, ClientResult, ParseError, ParseResult};
use flate2::read::GzDecoder;
use log::trace;
use reqwest::header::{HeaderMap, CONTENT_ENCODING, CONTENT_TYPE, LOCATION, SET_COOKIE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Joins the values of a header that was sent more than once.
pub const HEADER_VALUE_SEPARATOR: &str = " ";

/// A response normalized for comparison.
///
/// `content_length` is always the number of body bytes read off the wire,
/// never the declared `Content-Length`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseModel {
    status_code: u16,
    content_length: usize,
    content_type: String,
    location: String,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    #[serde(skip)]
    body: Vec<u8>,
}

impl ResponseModel {
    /// Parses a captured raw response. Header lines without a colon are
    /// skipped; only a broken status line is fatal.
    pub fn parse(raw: &[u8], policy: &ResponsePolicy) -> ParseResult<Self> {
        let (head, body) = split_head_body(raw);

        let mut lines = head
            .trim_start()
            .split('\n')
            .filter(|line| !line.trim().is_empty());
        let status_line = lines.next().unwrap_or_default();
        // An empty reason phrase still counts as the third field.
        let fields: Vec<&str> = status_line.trim_start().splitn(3, ' ').collect();
        if fields.len() != 3 {
            return Err(ParseError::MalformedStatusLine(status_line.to_string()));
        }
        let status_code = fields[1]
            .parse::<u16>()
            .map_err(|_| ParseError::MalformedStatusLine(status_line.to_string()))?;

        let mut response = Self {
            status_code,
            content_length: body.len(),
            body: body.to_vec(),
            ..Self::default()
        };

        let mut content_encoding = String::new();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                trace!("Skipping malformed response header line {:?}", line);
                continue;
            };
            let key = name.trim().to_ascii_lowercase();
            let value = value.trim();
            match key.as_str() {
                "content-length" => continue,
                "location" => response.location = value.to_string(),
                "set-cookie" => response.store_set_cookie(value),
                _ => {
                    if key == "content-encoding" {
                        content_encoding = value.to_ascii_lowercase();
                    }
                    response.append_header(key, value);
                }
            }
        }
        if let Some(content_type) = response.headers.get("content-type") {
            response.content_type = content_type.to_ascii_lowercase();
        }

        response.normalize_body(&content_encoding, policy);
        Ok(response)
    }

    /// Builds the model from a live response, reading (or draining) its body.
    pub async fn from_response(
        mut resp: reqwest::Response,
        policy: &ResponsePolicy,
    ) -> ClientResult<Self> {
        let mut response = Self {
            status_code: resp.status().as_u16(),
            ..Self::default()
        };

        let headers = resp.headers().clone();
        response.location = resolve_location(&headers, resp.url());
        for value in headers.get_all(SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                response.store_set_cookie(value);
            }
        }
        for (name, value) in headers.iter() {
            if name == SET_COOKIE || name == LOCATION {
                continue;
            }
            response.append_header(
                name.as_str().to_string(),
                &String::from_utf8_lossy(value.as_bytes()),
            );
        }
        if let Some(content_type) = headers.get(CONTENT_TYPE) {
            response.content_type =
                String::from_utf8_lossy(content_type.as_bytes()).to_ascii_lowercase();
        }

        if policy.store_full_body() {
            let bytes = resp.bytes().await.map_err(ClientError::Body)?;
            response.content_length = bytes.len();
            response.body = bytes.to_vec();
        } else {
            while let Some(chunk) = resp.chunk().await.map_err(ClientError::Body)? {
                response.content_length += chunk.len();
            }
        }

        let content_encoding = headers
            .get_all(CONTENT_ENCODING)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(HEADER_VALUE_SEPARATOR);
        response.normalize_body(&content_encoding, policy);
        Ok(response)
    }

    fn append_header(&mut self, key: String, value: &str) {
        self.headers
            .entry(key)
            .and_modify(|existing| {
                existing.push_str(HEADER_VALUE_SEPARATOR);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Keeps only the leading `name=value` of a `Set-Cookie` value.
    fn store_set_cookie(&mut self, value: &str) {
        let primary = value.split(';').next().unwrap_or_default();
        if let Some((name, value)) = primary.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    fn normalize_body(&mut self, content_encoding: &str, policy: &ResponsePolicy) {
        if !policy.store_full_body() {
            self.body.clear();
        } else {
            if content_encoding.contains("gzip") {
                if let Some(decoded) = gunzip(&self.body) {
                    self.body = decoded;
                }
            }
            if self.content_type.contains("json") && self.body.len() > 2 {
                self.body = pretty_json(&self.body);
            }
        }

        if policy.blacklist().matches(self.content_length) {
            trace!(
                "Content length {} is blacklisted, reporting status {} as 404",
                self.content_length,
                self.status_code
            );
            self.status_code = 404;
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status_code(&mut self, status_code: u16) {
        self.status_code = status_code;
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Splits at the first blank line. The head has its `\r`s removed; the body
/// bytes are returned untouched.
fn split_head_body(raw: &[u8]) -> (String, &[u8]) {
    let mut separator = None;
    for (i, byte) in raw.iter().enumerate() {
        if *byte != b'\n' {
            continue;
        }
        match (raw.get(i + 1), raw.get(i + 2)) {
            (Some(b'\n'), _) => {
                separator = Some((i, i + 2));
                break;
            }
            (Some(b'\r'), Some(b'\n')) => {
                separator = Some((i, i + 3));
                break;
            }
            _ => {}
        }
    }

    let (head, body): (&[u8], &[u8]) = match separator {
        Some((head_end, body_start)) => (&raw[..head_end], &raw[body_start..]),
        None => (raw, &[]),
    };
    let head = String::from_utf8_lossy(head).replace('\r', "");
    (head, body)
}

fn resolve_location(headers: &HeaderMap, base: &url::Url) -> String {
    let Some(location) = headers.get(LOCATION).and_then(|v| v.to_str().ok()) else {
        return String::new();
    };
    match base.join(location) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => location.to_string(),
    }
}

fn gunzip(data: &[u8]) -> Option<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(data).read_to_end(&mut decoded).ok()?;
    Some(decoded)
}

/// Re-indents a JSON document with tabs, keeping key order. Input that is not
/// valid JSON is returned unchanged.
pub fn pretty_json(data: &[u8]) -> Vec<u8> {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return data.to_vec();
    };
    let mut out = Vec::with_capacity(data.len() * 2);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    match serde::Serialize::serialize(&value, &mut serializer) {
        Ok(()) => out,
        Err(_) => data.to_vec(),
    }
}
