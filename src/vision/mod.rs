// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image handling for the reading pipeline
//!
//! This module provides:
//! - Upload validation and decoding
//! - Region boxes and cropping
//! - Upload and crop persistence

pub mod crop_store;
pub mod image_utils;
pub mod region;

pub use crop_store::{sanitize_file_name, CropStore, StorageError};
pub use image_utils::{decode_image_bytes, detect_format, format_to_extension, ImageError, ImageInfo};
pub use region::{crop_region, BoundingBox, RegionError};
