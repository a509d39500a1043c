// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the meter reading service

use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Default hosted detection API
pub const DEFAULT_API_URL: &str = "https://detect.roboflow.com";

/// Model used to find counter displays on the full image
pub const DEFAULT_REGION_MODEL_ID: &str = "counter_detection/1";

/// Model used to find digit and decimal point glyphs on a cropped counter
pub const DEFAULT_GLYPH_MODEL_ID: &str = "digits_segmentation/1";

/// Horizontal gap (detection coordinate units) that separates two glyph groups
pub const DEFAULT_GAP_THRESHOLD: f32 = 20.0;

/// Maximum upload size (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Top-level configuration for the node
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Detection backend settings
    pub detection: DetectionConfig,
    /// Reading pipeline settings
    pub pipeline: PipelineConfig,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
}

/// Settings for the external detection backend
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Base URL of the detection API
    pub api_url: String,
    /// API key sent with every inference call
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

/// Settings for the reading pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model identifier for counter regions
    pub region_model_id: String,
    /// Model identifier for glyphs
    pub glyph_model_id: String,
    /// Gap above which consecutive glyphs start a new group
    pub gap_threshold: f32,
    /// Detections below this confidence are discarded
    pub min_confidence: f32,
    /// Maximum regions processed at once
    pub max_concurrent_regions: usize,
    /// Directory for uploads and temporary crops
    pub uploads_dir: PathBuf,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    parse_or_default(key, env::var(key).ok().as_deref(), default)
}

/// Parse a raw variable value, warning when a set value is malformed
fn parse_or_default<T: std::str::FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring malformed {}={:?}, using default", key, value);
                default
            }
        },
    }
}

impl ReaderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            detection: DetectionConfig::from_env(),
            pipeline: PipelineConfig::from_env(),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.listen_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| format!("Invalid LISTEN_ADDR '{}': {}", self.listen_addr, e))?;
        if self.max_upload_bytes == 0 {
            return Err("Max upload size must be greater than 0".to_string());
        }
        self.detection.validate()?;
        self.pipeline.validate()
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            detection: DetectionConfig::default(),
            pipeline: PipelineConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl DetectionConfig {
    /// Load detection settings from environment variables
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("DETECTION_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: env::var("DETECTION_API_KEY").ok().filter(|k| !k.is_empty()),
            request_timeout_ms: env_parse("DETECTION_TIMEOUT_MS", 30_000),
        }
    }

    /// Validate the detection settings
    pub fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.api_url)
            .map_err(|e| format!("Invalid DETECTION_API_URL '{}': {}", self.api_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "DETECTION_API_URL must be http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.api_key.is_none() {
            return Err("DETECTION_API_KEY is not set".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("Detection timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            request_timeout_ms: 30_000,
        }
    }
}

impl PipelineConfig {
    /// Load pipeline settings from environment variables
    pub fn from_env() -> Self {
        Self {
            region_model_id: env::var("REGION_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_REGION_MODEL_ID.to_string()),
            glyph_model_id: env::var("GLYPH_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_GLYPH_MODEL_ID.to_string()),
            gap_threshold: env_parse("GLYPH_GAP_THRESHOLD", DEFAULT_GAP_THRESHOLD),
            min_confidence: env_parse("MIN_DETECTION_CONFIDENCE", 0.0),
            max_concurrent_regions: env_parse("MAX_CONCURRENT_REGIONS", 4),
            uploads_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./static/uploads/")),
        }
    }

    /// Validate the pipeline settings
    pub fn validate(&self) -> Result<(), String> {
        if self.region_model_id.trim().is_empty() || self.glyph_model_id.trim().is_empty() {
            return Err("Model identifiers must not be empty".to_string());
        }
        if !self.gap_threshold.is_finite() || self.gap_threshold < 0.0 {
            return Err(format!(
                "Gap threshold must be a non-negative number, got {}",
                self.gap_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "Minimum confidence must be within 0.0-1.0, got {}",
                self.min_confidence
            ));
        }
        if self.max_concurrent_regions == 0 {
            return Err("Max concurrent regions must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region_model_id: DEFAULT_REGION_MODEL_ID.to_string(),
            glyph_model_id: DEFAULT_GLYPH_MODEL_ID.to_string(),
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            min_confidence: 0.0,
            max_concurrent_regions: 4,
            uploads_dir: PathBuf::from("./static/uploads/"),
        }
    }
}
