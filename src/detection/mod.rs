// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! External object detection backend
//!
//! Components:
//! - `client` - `DetectionClient` trait used by the pipeline
//! - `http_client` - hosted detection API implementation
//! - `mock` - table-driven backend for tests
//! - `types` - detections and errors

pub mod client;
pub mod http_client;
pub mod mock;
pub mod types;

pub use client::DetectionClient;
pub use http_client::HttpDetectionClient;
pub use mock::{MockDetectionClient, MockOutcome};
pub use types::{Detection, DetectionError, InferenceResponse};
