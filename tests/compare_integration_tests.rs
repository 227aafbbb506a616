// File: compare_integration_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

mod common;

use common::{client, html_response, mount_get, setup_mock_server, test_config};
use rawdiff::comparer::{ComparisonConfig, FactorComparer};
use rawdiff::factor::Factor;
use rawdiff::fanout::FanOutComparer;
use rawdiff::rawresponse::ResponseModel;
use rawdiff::report::{ReportFormat, ReportGenerator};
use rstest::rstest;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::{MockServer, ResponseTemplate};

async fn mount_login_flow(server: &MockServer) {
    mount_get(
        server,
        "/",
        ResponseTemplate::new(200).set_body_raw("Hello, world", "text/plain; charset=utf-8"),
    )
    .await;
    mount_get(
        server,
        "/redirect",
        html_response(302, "<a href=\"https://github.com\">Found</a>")
            .insert_header("location", "https://github.com"),
    )
    .await;
    mount_get(
        server,
        "/success",
        html_response(302, "<a href=\"/secretpanel\">Found</a>.")
            .insert_header("set-cookie", "access_token=s3cr3t; Path=/; HttpOnly")
            .insert_header("location", "/secretpanel"),
    )
    .await;
}

async fn fetch_login_flow(server: &MockServer) -> (ResponseModel, ResponseModel, ResponseModel) {
    mount_login_flow(server).await;
    let http = client(test_config());
    let uri = server.uri();
    let home = http.get_normalized(&uri).await.unwrap();
    let redirect = http
        .get_normalized(&format!("{}/redirect", uri))
        .await
        .unwrap();
    let success = http
        .get_normalized(&format!("{}/success", uri))
        .await
        .unwrap();
    (home, redirect, success)
}

#[tokio::test]
async fn test_compare_live_responses() {
    let mock_server = setup_mock_server().await;
    let (home, redirect, success) = fetch_login_flow(&mock_server).await;
    let config = ComparisonConfig::default();

    let changes = FactorComparer::compare(Some(&home), Some(&redirect), &config).unwrap();
    let factors: Vec<Factor> = changes.iter().map(|c| c.factor).collect();
    assert_eq!(
        factors,
        vec![
            Factor::StatusCode,
            Factor::ContentLength,
            Factor::ContentType,
            Factor::Location
        ]
    );
    assert_eq!(changes[0].old, "200");
    assert_eq!(changes[0].new, "302");
    assert_eq!(changes[2].old, "text/plain; charset=utf-8");
    assert_eq!(changes[2].new, "text/html");

    let changes = FactorComparer::compare(Some(&redirect), Some(&success), &config).unwrap();
    let factors: Vec<Factor> = changes.iter().map(|c| c.factor).collect();
    assert_eq!(
        factors,
        vec![Factor::ContentLength, Factor::Location, Factor::Cookie]
    );
    assert_eq!(changes[1].new, format!("{}/secretpanel", mock_server.uri()));
    assert_eq!(changes[2].old, "");
    assert_eq!(changes[2].new, "access_token // Extra Cookie\n");
}

#[tokio::test]
async fn test_compare_live_response_with_itself() {
    let mock_server = setup_mock_server().await;
    let (_, _, success) = fetch_login_flow(&mock_server).await;

    let config = ComparisonConfig::empty();
    let changes = FactorComparer::compare(Some(&success), Some(&success), &config).unwrap();
    assert!(changes.is_empty());
}

#[rstest]
#[case(1)]
#[case(4)]
#[tokio::test]
async fn test_fan_out_live_responses(#[case] concurrency: usize) {
    let mock_server = setup_mock_server().await;
    let (home, redirect, success) = fetch_login_flow(&mock_server).await;

    let baseline = Arc::new(home.clone());
    let candidates = vec![Arc::new(redirect), Arc::new(home), Arc::new(success)];

    let results = FanOutComparer::new()
        .with_concurrency(concurrency)
        .compare(baseline, candidates, CancellationToken::new())
        .await;

    assert_eq!(results.len(), 2);
    let mut indices: Vec<usize> = results.iter().map(|r| r.index).collect();
    indices.sort();
    assert_eq!(indices, vec![0, 2]);
    assert!(results.iter().all(|r| !r.changes.is_empty()));
}

#[tokio::test]
async fn test_fan_out_cancelled_before_start() {
    let mock_server = setup_mock_server().await;
    let (home, redirect, success) = fetch_login_flow(&mock_server).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let results = FanOutComparer::new()
        .with_concurrency(2)
        .compare(
            Arc::new(home),
            vec![Arc::new(redirect), Arc::new(success)],
            cancel,
        )
        .await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_fan_out_report_file() {
    let mock_server = setup_mock_server().await;
    let (home, redirect, success) = fetch_login_flow(&mock_server).await;

    let results = FanOutComparer::new()
        .compare(
            Arc::new(home),
            vec![Arc::new(success), Arc::new(redirect)],
            CancellationToken::new(),
        )
        .await;
    let entries = ReportGenerator::entries(&results);

    let temp_dir = TempDir::new().unwrap();
    let report_path = temp_dir.path().join("changes.json");
    ReportGenerator::generate_report(&entries, &report_path, ReportFormat::Json).unwrap();

    let content = std::fs::read_to_string(&report_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["index"], 0);
    assert_eq!(json[0]["status_code"], 302);
    assert_eq!(json[0]["changes"][0]["factor"], "StatusCode");
}
