// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod detection;
pub mod pipeline;
pub mod reading;
pub mod version;
pub mod vision;

// Re-export main types
pub use config::{DetectionConfig, PipelineConfig, ReaderConfig};
pub use detection::{Detection, DetectionClient, DetectionError, HttpDetectionClient};
pub use pipeline::{PipelineError, ReadingPipeline};
pub use reading::{assemble_reading, group_glyphs, resolve_label, Glyph, Reading, ReadingSet};
