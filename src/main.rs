// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use fabstir_meter_reader::{
    api::{start_server, AppState},
    config::ReaderConfig,
    detection::HttpDetectionClient,
    pipeline::ReadingPipeline,
    version,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Fabstir Meter Reader...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = ReaderConfig::from_env();
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    println!("🔌 Detection backend: {}", config.detection.api_url);
    println!("   Region model: {}", config.pipeline.region_model_id);
    println!("   Glyph model:  {}", config.pipeline.glyph_model_id);

    let client = Arc::new(HttpDetectionClient::new(&config.detection)?);
    let pipeline = Arc::new(ReadingPipeline::new(client, config.pipeline.clone())?);
    let state = AppState::new(pipeline, config.max_upload_bytes);

    println!("🌐 Listening on http://{}", config.listen_addr);
    println!("   POST /predict  (multipart field \"image\")");
    println!("   GET  /health");
    println!();

    start_server(&config.listen_addr, state)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    println!("👋 Meter reader stopped");
    Ok(())
}
