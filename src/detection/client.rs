// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection client trait definition

use async_trait::async_trait;
use std::path::Path;

use super::types::{Detection, DetectionError};

/// Trait for object detection backends
///
/// The pipeline talks to the backend only through this trait, so tests and
/// alternative backends can be swapped in without touching request handling.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// Run a detection model on an image file
    ///
    /// # Arguments
    /// * `image_path` - Image to submit
    /// * `model_id` - Backend model identifier (e.g. `counter_detection/1`)
    ///
    /// # Returns
    /// The detections found, empty when the backend reported none
    async fn infer(
        &self,
        image_path: &Path,
        model_id: &str,
    ) -> Result<Vec<Detection>, DetectionError>;

    /// Get the backend name for logging
    fn name(&self) -> &'static str;

    /// Check whether the backend is reachable
    async fn health_check(&self) -> bool {
        true
    }
}
