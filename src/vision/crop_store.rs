// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! On-disk storage for uploads and region crops
//!
//! Uploads are kept under a per-request unique name. Crops only live as long
//! as the detection call that consumes them: each one is a `NamedTempFile`
//! removed when its handle drops.

use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::image_utils::format_to_extension;

/// Errors from the upload directory
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode crop: {0}")]
    Encode(String),
}

/// Upload directory shared by all requests
#[derive(Debug, Clone)]
pub struct CropStore {
    root: PathBuf,
}

impl CropStore {
    /// Open the store, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an uploaded image under a unique name
    ///
    /// The client-supplied name is reduced to a safe file name and prefixed
    /// with a fresh UUID, so concurrent uploads never overwrite each other.
    pub async fn save_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        format: Option<ImageFormat>,
    ) -> Result<PathBuf, StorageError> {
        let mut name = sanitize_file_name(file_name);
        if !name.contains('.') {
            if let Some(format) = format {
                name = format!("{}.{}", name, format_to_extension(format));
            }
        }

        let path = self.root.join(format!("{}_{}", Uuid::new_v4(), name));
        tokio::fs::write(&path, bytes).await?;
        debug!("Saved upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Write a crop to a temporary JPEG for the detection backend
    pub fn persist_crop(
        &self,
        crop: &DynamicImage,
        region_index: usize,
    ) -> Result<NamedTempFile, StorageError> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("crop_{}_", region_index))
            .suffix(".jpg")
            .tempfile_in(&self.root)?;

        // JPEG has no alpha channel
        DynamicImage::ImageRgb8(crop.to_rgb8())
            .write_to(&mut file, ImageFormat::Jpeg)
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        Ok(file)
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, last path segment only
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
