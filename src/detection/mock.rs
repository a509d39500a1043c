// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory detection backend for tests and offline runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::client::DetectionClient;
use super::types::{Detection, DetectionError};

/// Canned answer for one inference call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return these detections
    Detections(Vec<Detection>),
    /// Fail with a timeout
    Timeout,
    /// Fail with a transport error
    Transport(String),
}

impl MockOutcome {
    fn into_result(self) -> Result<Vec<Detection>, DetectionError> {
        match self {
            MockOutcome::Detections(detections) => Ok(detections),
            MockOutcome::Timeout => Err(DetectionError::Timeout { timeout_ms: 0 }),
            MockOutcome::Transport(message) => Err(DetectionError::Transport(message)),
        }
    }
}

/// A recorded inference call
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub file_name: String,
    pub model_id: String,
}

/// Detection backend that answers from fixed tables
///
/// Calls with `region_model_id` get the region outcome. Any other call is
/// treated as a glyph pass on a crop; the region index is read back from the
/// crop's `crop_<index>_*` file name.
#[derive(Clone)]
pub struct MockDetectionClient {
    region_model_id: String,
    regions: MockOutcome,
    glyphs: HashMap<usize, MockOutcome>,
    delays: HashMap<usize, Duration>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockDetectionClient {
    pub fn new(region_model_id: &str, regions: Vec<Detection>) -> Self {
        Self {
            region_model_id: region_model_id.to_string(),
            regions: MockOutcome::Detections(regions),
            glyphs: HashMap::new(),
            delays: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the region pass outcome
    pub fn with_region_outcome(mut self, outcome: MockOutcome) -> Self {
        self.regions = outcome;
        self
    }

    /// Glyphs returned for the crop of region `index`
    pub fn with_glyphs(mut self, index: usize, glyphs: Vec<Detection>) -> Self {
        self.glyphs.insert(index, MockOutcome::Detections(glyphs));
        self
    }

    /// Outcome for the crop of region `index`
    pub fn with_glyph_outcome(mut self, index: usize, outcome: MockOutcome) -> Self {
        self.glyphs.insert(index, outcome);
        self
    }

    /// Delay the glyph answer for region `index`
    pub fn with_delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// Calls received so far
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }
}

/// Region index encoded in a crop file name
pub fn crop_index(image_path: &Path) -> Option<usize> {
    let name = image_path.file_name()?.to_str()?;
    name.strip_prefix("crop_")?.split('_').next()?.parse().ok()
}

#[async_trait]
impl DetectionClient for MockDetectionClient {
    async fn infer(
        &self,
        image_path: &Path,
        model_id: &str,
    ) -> Result<Vec<Detection>, DetectionError> {
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.lock().await.push(MockCall {
            file_name,
            model_id: model_id.to_string(),
        });

        if model_id == self.region_model_id {
            return self.regions.clone().into_result();
        }

        let index = crop_index(image_path);
        if let Some(delay) = index.and_then(|i| self.delays.get(&i)) {
            tokio::time::sleep(*delay).await;
        }

        index
            .and_then(|i| self.glyphs.get(&i).cloned())
            .unwrap_or(MockOutcome::Detections(Vec::new()))
            .into_result()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
