//! End-to-end tests of the assembled service on the in-memory store

mod common;

use std::time::Duration;

use axum::http::StatusCode;

use common::assertions::DashboardAssertions;
use common::*;
use vulnera_analytic::create_app;

#[tokio::test]
async fn test_inline_ingestion_feeds_the_dashboard() {
    let app = create_app(memory_config(false)).await.unwrap();
    let workspace_id = uuid::Uuid::new_v4();
    let payload = analysis_payload(
        workspace_id,
        &[("alice@example.com", "Go"), ("bob@example.com", "Go")],
    );

    let (status, _) = post_analysis(&app.router, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.ingestion_worker.is_none());

    let (status, body) = get(
        &app.router,
        &format!("/api/v1/workspaces/{}/dashboard", workspace_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    body.assert_total_developers(2)
        .assert_total_repositories(1)
        .assert_open_findings("critical", 2)
        .assert_chart_len("vulnerabilitiesByAuthor", 2)
        .assert_chart_len("vulnerabilitiesByLanguage", 1)
        .assert_chart_len("vulnerabilitiesByTime", 1);
}

#[tokio::test]
async fn test_queued_ingestion_is_drained_by_worker() {
    let app = create_app(memory_config(true)).await.unwrap();
    let workspace_id = uuid::Uuid::new_v4();
    let payload = analysis_payload(workspace_id, &[("alice@example.com", "Rust")]);

    let (status, body) = post_analysis(&app.router, &payload).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");

    let uri = format!("/api/v1/workspaces/{}/dashboard", workspace_id);
    let mut charts = serde_json::Value::Null;
    for _ in 0..100 {
        let (_, body) = get(&app.router, &uri).await;
        if body["totalDevelopers"].as_u64() == Some(1) {
            charts = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    charts
        .assert_total_developers(1)
        .assert_open_findings("critical", 1);

    app.shutdown_token.cancel();
    let worker = app.ingestion_worker.expect("worker should be running");
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("worker should stop after cancellation")
        .unwrap();
}

#[tokio::test]
async fn test_health_reports_queue_when_worker_runs() {
    let app = create_app(memory_config(true)).await.unwrap();

    let (status, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["ingestion"]["mode"], "queued");
    assert_eq!(body["details"]["ingestion"]["capacity"], 16);

    app.shutdown_token.cancel();
}

#[tokio::test]
async fn test_concurrent_strategy_serves_the_same_charts() {
    let mut config = memory_config(false);
    config.dashboard.query_strategy =
        vulnera_analytic_core::application::dashboard::QueryStrategy::Concurrent;
    let app = create_app(config).await.unwrap();
    let workspace_id = uuid::Uuid::new_v4();

    post_analysis(
        &app.router,
        &analysis_payload(workspace_id, &[("alice@example.com", "Go")]),
    )
    .await;
    let (status, body) = get(
        &app.router,
        &format!("/api/v1/workspaces/{}/dashboard", workspace_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    body.assert_total_developers(1).assert_chart_len("vulnerabilitiesByRepository", 1);
}
