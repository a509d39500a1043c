// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for object detection results

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A single object detected by the backend
///
/// Coordinates are in the pixel space of the image that was submitted, with
/// `center_x`/`center_y` marking the middle of the box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Horizontal center of the box
    #[serde(rename = "x", default)]
    pub center_x: f32,
    /// Vertical center of the box
    #[serde(rename = "y", default)]
    pub center_y: f32,
    /// Box width
    #[serde(default)]
    pub width: f32,
    /// Box height
    #[serde(default)]
    pub height: f32,
    /// Numeric class identifier
    #[serde(default, deserialize_with = "deserialize_class_id")]
    pub class_id: Option<i64>,
    /// Class name as reported by the model
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Confidence score (0.0-1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Class ids as backends actually send them
#[derive(Deserialize)]
#[serde(untagged)]
enum RawClassId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawClassId {
    fn to_id(&self) -> Option<i64> {
        match self {
            RawClassId::Int(id) => Some(*id),
            RawClassId::Float(id) => id.is_finite().then(|| id.trunc() as i64),
            RawClassId::Text(text) => {
                let text = text.trim();
                text.parse::<i64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|id| id.is_finite())
                        .map(|id| id.trunc() as i64)
                })
            }
        }
    }
}

/// Accept `5`, `5.0` or `"5"`; anything unreadable becomes `None`
fn deserialize_class_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawClassId>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| raw.to_id()))
}

impl Detection {
    /// Create a detection from its center and size
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
            class_id: None,
            class_name: None,
            confidence: None,
        }
    }

    /// Set the class identifier
    pub fn with_class_id(mut self, class_id: i64) -> Self {
        self.class_id = Some(class_id);
        self
    }

    /// Set the confidence score
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Whether this detection passes a confidence floor.
    ///
    /// Detections without a score always pass.
    pub fn meets_confidence(&self, min_confidence: f32) -> bool {
        self.confidence.map_or(true, |c| c >= min_confidence)
    }
}

/// Raw inference payload returned by the detection API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InferenceResponse {
    /// Detected objects; absent when the backend found nothing usable
    #[serde(default)]
    pub predictions: Option<Vec<Detection>>,
}

impl InferenceResponse {
    /// Flatten into a detection list, treating a missing key as empty
    pub fn into_detections(self) -> Vec<Detection> {
        self.predictions.unwrap_or_default()
    }
}

/// Errors that can occur while calling the detection backend
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The image to submit could not be read
    #[error("Failed to read image {path}: {source}")]
    ReadImage {
        path: String,
        source: std::io::Error,
    },

    /// The backend did not answer in time
    #[error("Detection backend timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that was exceeded
        timeout_ms: u64,
    },

    /// Connection-level failure
    #[error("Detection backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with an error status
    #[error("Detection API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// The backend answered with something we could not parse
    #[error("Invalid detection response: {0}")]
    InvalidResponse(String),
}
