// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::http_server::AppState;
use crate::version::VERSION_NUMBER;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

/// GET /health - Service and detection backend status
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let client = state.pipeline.client();
    let backend_ok = client.health_check().await;

    let issues = if backend_ok {
        None
    } else {
        Some(vec!["Detection backend unreachable".to_string()])
    };

    Json(HealthResponse {
        status: if backend_ok { "ok" } else { "degraded" }.to_string(),
        version: VERSION_NUMBER.to_string(),
        backend: client.name().to_string(),
        issues,
    })
}
