// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from the environment

pub mod reader;

pub use reader::{DetectionConfig, PipelineConfig, ReaderConfig};
