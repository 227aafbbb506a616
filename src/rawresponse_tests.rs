// File: rawresponse_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#[cfg(test)]
mod tests {
    use crate::config::{BlacklistMode, ResponsePolicy};
    use crate::error::ParseError;
    use crate::rawresponse::{pretty_json, ResponseModel};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use rstest::*;
    use std::io::Write;

    fn policy() -> ResponsePolicy {
        ResponsePolicy::default()
    }

    #[test]
    fn test_parse_basic_response() {
        let raw = b"HTTP/1.1 200 OK\r\nServer: nginx\r\nContent-Type: Text/HTML; charset=UTF-8\r\n\r\n<h1>hello</h1>";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), "text/html; charset=utf-8");
        assert_eq!(response.header("server"), Some("nginx"));
        assert_eq!(response.body(), b"<h1>hello</h1>");
        assert_eq!(response.content_length(), 14);
    }

    #[test]
    fn test_declared_content_length_is_ignored() {
        let raw = b"HTTP/1.1 200 OK\nContent-Length: 9999\n\nshort";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.content_length(), 5);
        assert!(response.header("content-length").is_none());
    }

    #[test]
    fn test_response_without_body() {
        let raw = b"HTTP/1.1 204 No Content\nServer: test\n";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.status_code(), 204);
        assert_eq!(response.content_length(), 0);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_body_keeps_blank_lines() {
        let raw = b"HTTP/1.1 200 OK\n\nline one\n\nline two";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.body_text(), "line one\n\nline two");
    }

    #[rstest]
    #[case("HTTP/1.1 200")]
    #[case("HTTP/1.1")]
    #[case("")]
    #[case("HTTP/1.1 abc OK")]
    fn test_malformed_status_line(#[case] status_line: &str) {
        let raw = format!("{}\nServer: test\n\nbody", status_line);
        let result = ResponseModel::parse(raw.as_bytes(), &policy());

        assert!(matches!(result, Err(ParseError::MalformedStatusLine(_))));
    }

    #[test]
    fn test_reason_phrase_with_spaces() {
        let raw = b"HTTP/1.1 503 Service Temporarily Unavailable\n\n";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.status_code(), 503);
    }

    #[rstest]
    #[case(b"HTTP/1.1 200 \nServer: test\n\nbody".as_slice())]
    #[case(b"HTTP/1.1 200 \r\n\r\nbody".as_slice())]
    fn test_empty_reason_phrase(#[case] raw: &[u8]) {
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_text(), "body");
    }

    #[test]
    fn test_malformed_header_lines_are_skipped() {
        let raw = b"HTTP/1.1 200 OK\nServer: test\nthis is garbage\nX-Frame-Options: DENY\n\nok";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.header("x-frame-options"), Some("DENY"));
    }

    #[test]
    fn test_set_cookie_and_location_are_not_headers() {
        let raw = b"HTTP/1.1 302 Found\n\
Location: /secretpanel\n\
Set-Cookie: access_token=abc.def; Path=/; HttpOnly\n\
Set-Cookie: theme=dark\n\
Set-Cookie: broken\n\
\n";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.location(), "/secretpanel");
        assert_eq!(response.cookies().len(), 2);
        assert_eq!(response.cookies().get("access_token").map(String::as_str), Some("abc.def"));
        assert_eq!(response.cookies().get("theme").map(String::as_str), Some("dark"));
        assert!(response.header("set-cookie").is_none());
        assert!(response.header("location").is_none());
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let raw = b"HTTP/1.1 200 OK\nVary: Accept\nVary: Origin\n\n";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.header("vary"), Some("Accept Origin"));
    }

    #[test]
    fn test_json_body_is_pretty_printed() {
        let raw = b"HTTP/1.1 200 OK\nContent-Type: application/json\n\n{\"b\":1,\"a\":[true,null]}";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(
            response.body_text(),
            "{\n\t\"b\": 1,\n\t\"a\": [\n\t\ttrue,\n\t\tnull\n\t]\n}"
        );
        assert_eq!(response.content_length(), 23);
    }

    #[test]
    fn test_invalid_json_body_is_unchanged() {
        let raw = b"HTTP/1.1 200 OK\nContent-Type: application/json\n\n{not json";
        let response = ResponseModel::parse(raw, &policy()).unwrap();

        assert_eq!(response.body(), b"{not json");
    }

    #[test]
    fn test_pretty_json_passthrough() {
        assert_eq!(pretty_json(b"plain text"), b"plain text".to_vec());
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"compressed payload").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut raw = b"HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\n\r\n".to_vec();
        raw.extend_from_slice(&compressed);
        let response = ResponseModel::parse(&raw, &policy()).unwrap();

        assert_eq!(response.body(), b"compressed payload");
        assert_eq!(response.content_length(), compressed.len());
    }

    #[test]
    fn test_blacklisted_length_becomes_404() {
        let mut policy = ResponsePolicy::new();
        policy.set_blacklist(BlacklistMode::Exact(9));

        let raw = b"HTTP/1.1 200 OK\n\nnot found";
        let response = ResponseModel::parse(raw, &policy).unwrap();
        assert_eq!(response.status_code(), 404);

        let raw = b"HTTP/1.1 200 OK\n\nfound it!!";
        let response = ResponseModel::parse(raw, &policy).unwrap();
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_blacklisted_range_becomes_404() {
        let mut policy = ResponsePolicy::new();
        policy.set_blacklist(BlacklistMode::Range { min: 3, max: 6 });

        let raw = b"HTTP/1.1 200 OK\n\nabcd";
        assert_eq!(ResponseModel::parse(raw, &policy).unwrap().status_code(), 404);

        let raw = b"HTTP/1.1 200 OK\n\nabcdefgh";
        assert_eq!(ResponseModel::parse(raw, &policy).unwrap().status_code(), 200);
    }

    #[test]
    fn test_store_full_body_disabled_still_measures() {
        let mut policy = ResponsePolicy::new();
        policy.set_store_full_body(false);

        let raw = b"HTTP/1.1 200 OK\n\n0123456789";
        let response = ResponseModel::parse(raw, &policy).unwrap();

        assert!(response.body().is_empty());
        assert_eq!(response.content_length(), 10);
    }
}
