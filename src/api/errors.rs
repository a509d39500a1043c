// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detection::DetectionError;
use crate::pipeline::PipelineError;

/// Body of every error response: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    PayloadTooLarge(String),
    NoPredictions,
    BadGateway(String),
    Timeout(String),
    InternalError(String),
}

impl ApiError {
    /// Message placed in the `error` field
    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Timeout(msg)
            | ApiError::InternalError(msg) => msg.clone(),
            ApiError::NoPredictions => "No predictions found".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.message(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::NoPredictions | ApiError::InternalError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::Timeout(_) => 504,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::NoPredictions => write!(f, "No predictions found"),
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NoPredictions => ApiError::NoPredictions,
            PipelineError::Upstream(e @ DetectionError::Timeout { .. }) => {
                ApiError::Timeout(e.to_string())
            }
            PipelineError::Upstream(e) => {
                ApiError::BadGateway(format!("Detection backend error: {}", e))
            }
            PipelineError::Image(msg) => ApiError::InternalError(format!("Failed to load image: {}", msg)),
            PipelineError::Storage(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
