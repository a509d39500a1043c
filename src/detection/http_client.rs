// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted detection API client
//!
//! Submits base64-encoded images to a Roboflow-style hosted inference API:
//! `POST {api_url}/{model_id}?api_key=...` with the encoded image as the
//! form-urlencoded body, answered by `{"predictions": [...]}`.

use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::client::DetectionClient;
use super::types::{Detection, DetectionError, InferenceResponse};
use crate::config::DetectionConfig;

/// Client for a hosted object detection API
pub struct HttpDetectionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl HttpDetectionClient {
    /// Create a new detection client
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let endpoint = config.api_url.trim_end_matches('/').to_string();
        info!(
            "Detection client configured: endpoint={}, timeout={}ms",
            endpoint, config.request_timeout_ms
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Get the configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn model_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.endpoint, model_id.trim_matches('/'))
    }

    fn map_send_error(&self, e: reqwest::Error) -> DetectionError {
        if e.is_timeout() {
            DetectionError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            DetectionError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn infer(
        &self,
        image_path: &Path,
        model_id: &str,
    ) -> Result<Vec<Detection>, DetectionError> {
        let start = std::time::Instant::now();
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|source| DetectionError::ReadImage {
                path: image_path.display().to_string(),
                source,
            })?;
        let encoded = STANDARD.encode(&bytes);

        let mut request = self
            .client
            .post(self.model_url(model_id))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encoded);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DetectionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: InferenceResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                DetectionError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                DetectionError::InvalidResponse(format!("JSON parse error: {}", e))
            }
        })?;
        let detections = payload.into_detections();

        debug!(
            "Detection {} on {}: {} predictions in {}ms",
            model_id,
            image_path.display(),
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "hosted-detection"
    }

    async fn health_check(&self) -> bool {
        match self.client.get(&self.endpoint).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!("Detection backend health check failed: {}", e);
                false
            }
        }
    }
}
