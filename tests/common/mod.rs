//! Common test utilities for the assembled service

#![allow(dead_code)]

pub mod assertions;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use vulnera_analytic::Config;
use vulnera_analytic_core::config::StorageBackend;

/// Configuration backed by the in-memory store
pub fn memory_config(ingestion_enabled: bool) -> Config {
    let mut config = Config::default();
    config.database.backend = StorageBackend::Memory;
    config.ingestion.enabled = ingestion_enabled;
    config.ingestion.queue_capacity = 16;
    config
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_analysis(router: &Router, payload: &Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/analytics/analysis")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await
}

/// Finished analysis with one Critical finding per (email, language) pair
pub fn analysis_payload(workspace_id: uuid::Uuid, findings: &[(&str, &str)]) -> Value {
    let analysis_id = uuid::Uuid::new_v4();
    let vulnerabilities: Vec<Value> = findings
        .iter()
        .map(|(email, language)| {
            json!({
                "vulnerabilityID": uuid::Uuid::new_v4(),
                "analysisID": analysis_id,
                "vulnerability": {
                    "language": language,
                    "severity": "CRITICAL",
                    "type": "Vulnerability",
                    "commitEmail": email,
                    "securityTool": "HorusecEngine"
                }
            })
        })
        .collect();

    json!({
        "id": analysis_id,
        "repositoryID": uuid::Uuid::new_v4(),
        "repositoryName": "core-api",
        "workspaceID": workspace_id,
        "workspaceName": "platform",
        "status": "success",
        "createdAt": "2021-03-31T10:58:42Z",
        "analysisVulnerabilities": vulnerabilities
    })
}
