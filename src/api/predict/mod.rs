// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict API endpoint module
//!
//! Provides POST /predict for reading meter photos.

pub mod handler;

pub use handler::{predict_handler, ImageUpload, IMAGE_FIELD};
