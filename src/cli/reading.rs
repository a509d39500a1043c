// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::reader::{
    DEFAULT_API_URL, DEFAULT_GLYPH_MODEL_ID, DEFAULT_REGION_MODEL_ID,
};
use crate::config::{DetectionConfig, PipelineConfig};
use crate::detection::HttpDetectionClient;
use crate::pipeline::ReadingPipeline;
use crate::reading::{assemble_reading, group_glyphs, Glyph};

/// Arguments for the read command
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Image file to read
    pub image: PathBuf,

    /// Detection API base URL
    #[arg(long, env = "DETECTION_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Detection API key
    #[arg(long, env = "DETECTION_API_KEY")]
    pub api_key: Option<String>,

    /// Model used to find counters
    #[arg(long, env = "REGION_MODEL_ID", default_value = DEFAULT_REGION_MODEL_ID)]
    pub region_model: String,

    /// Model used to find glyphs
    #[arg(long, env = "GLYPH_MODEL_ID", default_value = DEFAULT_GLYPH_MODEL_ID)]
    pub glyph_model: String,

    /// Gap that separates glyph groups
    #[arg(long, env = "GLYPH_GAP_THRESHOLD", default_value_t = 20.0)]
    pub gap_threshold: f32,

    /// Discard detections below this confidence
    #[arg(long, env = "MIN_DETECTION_CONFIDENCE", default_value_t = 0.0)]
    pub min_confidence: f32,

    /// Regions processed at once
    #[arg(long, env = "MAX_CONCURRENT_REGIONS", default_value_t = 4)]
    pub max_concurrent_regions: usize,

    /// Directory for temporary crops
    #[arg(long, env = "UPLOAD_DIR", default_value = "./static/uploads/")]
    pub upload_dir: PathBuf,

    /// Backend request timeout in milliseconds
    #[arg(long, env = "DETECTION_TIMEOUT_MS", default_value_t = 30_000)]
    pub timeout_ms: u64,
}

/// Arguments for the group command
#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Comma-separated glyph center x coordinates
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub x: Vec<f32>,

    /// Comma-separated glyph labels, one per coordinate
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Gap that separates glyph groups
    #[arg(long, default_value_t = 20.0)]
    pub gap_threshold: f32,
}

impl ReadArgs {
    fn detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout_ms: self.timeout_ms,
        }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            region_model_id: self.region_model.clone(),
            glyph_model_id: self.glyph_model.clone(),
            gap_threshold: self.gap_threshold,
            min_confidence: self.min_confidence,
            max_concurrent_regions: self.max_concurrent_regions,
            uploads_dir: self.upload_dir.clone(),
        }
    }
}

/// Run the full pipeline on a local image and print the readings
pub async fn read_image(args: ReadArgs) -> Result<()> {
    let detection = args.detection_config();
    detection.validate().map_err(|e| anyhow!(e))?;
    let pipeline_config = args.pipeline_config();
    pipeline_config.validate().map_err(|e| anyhow!(e))?;

    let client = Arc::new(HttpDetectionClient::new(&detection)?);
    let pipeline = ReadingPipeline::new(client, pipeline_config)?;

    println!("🔍 Reading {}...", args.image.display());
    let readings = pipeline
        .read_meter_file(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    info!("{} readings", readings.len());
    println!("{}", serde_json::to_string_pretty(&readings)?);
    Ok(())
}

/// Group explicit glyph positions and print groups and reading
pub fn group(args: GroupArgs) -> Result<()> {
    let output = group_output(&args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn group_output(args: &GroupArgs) -> Result<serde_json::Value> {
    if args.x.len() != args.labels.len() {
        return Err(anyhow!(
            "Got {} coordinates but {} labels",
            args.x.len(),
            args.labels.len()
        ));
    }

    let glyphs: Vec<Glyph> = args
        .x
        .iter()
        .zip(&args.labels)
        .map(|(x, label)| Glyph::new(*x, label.as_str()))
        .collect();
    let groups = group_glyphs(&glyphs, args.gap_threshold);
    let reading = assemble_reading(&groups);

    Ok(serde_json::json!({
        "groups": groups,
        "reading": reading,
    }))
}
