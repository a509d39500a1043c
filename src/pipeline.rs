// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Meter reading pipeline
//!
//! One request runs a region pass on the full image, then a glyph pass on
//! the crop of every detected region. Region work runs with bounded
//! concurrency; results are reassembled in detection order.

use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::detection::{Detection, DetectionClient, DetectionError};
use crate::reading::{assemble_reading, group_glyphs, Glyph, Reading, ReadingSet};
use crate::vision::{crop_region, BoundingBox, CropStore, StorageError};

/// Errors that abort a whole request
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The region pass found nothing usable
    #[error("No predictions found")]
    NoPredictions,

    /// The detection backend failed
    #[error(transparent)]
    Upstream(#[from] DetectionError),

    /// The source image could not be loaded
    #[error("Failed to load image: {0}")]
    Image(String),

    /// Crops could not be written
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Orchestrates detection, cropping, grouping and assembly
pub struct ReadingPipeline {
    client: Arc<dyn DetectionClient>,
    config: PipelineConfig,
    store: CropStore,
}

impl ReadingPipeline {
    /// Create a pipeline, opening the uploads directory
    pub fn new(
        client: Arc<dyn DetectionClient>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let store = CropStore::new(&config.uploads_dir)?;
        info!(
            "Reading pipeline ready: backend={}, regions={}, glyphs={}, gap={}",
            client.name(),
            config.region_model_id,
            config.glyph_model_id,
            config.gap_threshold
        );
        Ok(Self {
            client,
            config,
            store,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Upload directory used for saved images and crops
    pub fn store(&self) -> &CropStore {
        &self.store
    }

    pub fn client(&self) -> &Arc<dyn DetectionClient> {
        &self.client
    }

    /// Load an image file and read it
    pub async fn read_meter_file(&self, image_path: &Path) -> Result<ReadingSet, PipelineError> {
        let image = image::ImageReader::open(image_path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| PipelineError::Image(e.to_string()))?
            .decode()
            .map_err(|e| PipelineError::Image(e.to_string()))?;
        self.read_meter(image_path, &image).await
    }

    /// Read every counter in an image
    ///
    /// `image_path` is what the backend receives for the region pass;
    /// `image` is the same picture, decoded, used for cropping.
    pub async fn read_meter(
        &self,
        image_path: &Path,
        image: &DynamicImage,
    ) -> Result<ReadingSet, PipelineError> {
        let start = Instant::now();

        let regions: Vec<Detection> = self
            .client
            .infer(image_path, &self.config.region_model_id)
            .await?
            .into_iter()
            .filter(|d| d.meets_confidence(self.config.min_confidence))
            .collect();

        if regions.is_empty() {
            warn!("No counter regions detected in {}", image_path.display());
            return Err(PipelineError::NoPredictions);
        }
        let region_count = regions.len();
        info!("{} counter regions detected", region_count);

        let results: Vec<(usize, Result<Option<Reading>, PipelineError>)> =
            stream::iter(regions.into_iter().enumerate())
                .map(|(index, region)| async move {
                    (index, self.read_region(image, index, &region).await)
                })
                .buffered(self.config.max_concurrent_regions.max(1))
                .collect()
                .await;

        let mut readings = ReadingSet::new();
        let mut failed = 0;
        let mut first_error = None;
        for (index, result) in results {
            match result {
                Ok(Some(reading)) => readings.insert(index, reading),
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping region {}: {}", index, e);
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        // Fatal only when no region could be read at all
        if failed == region_count {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        info!(
            "Read {}/{} regions in {}ms",
            readings.len(),
            region_count,
            start.elapsed().as_millis()
        );
        Ok(readings)
    }

    /// Crop one region and read its glyphs. `None` means skip the region.
    ///
    /// Errors are absorbed per region by `read_meter`.
    async fn read_region(
        &self,
        image: &DynamicImage,
        index: usize,
        region: &Detection,
    ) -> Result<Option<Reading>, PipelineError> {
        let bbox = BoundingBox::from_detection(region);
        let crop = match crop_region(image, &bbox) {
            Ok(crop) => crop,
            Err(e) => {
                warn!("Skipping region {}: {}", index, e);
                return Ok(None);
            }
        };

        let crop_file = self.store.persist_crop(&crop, index)?;
        let detections = self
            .client
            .infer(crop_file.path(), &self.config.glyph_model_id)
            .await?;
        drop(crop_file);

        let glyphs: Vec<Glyph> = detections
            .iter()
            .filter(|d| d.meets_confidence(self.config.min_confidence))
            .map(Glyph::from)
            .collect();

        if glyphs.is_empty() {
            debug!("Region {}: no glyph predictions", index);
            return Ok(None);
        }

        let groups = group_glyphs(&glyphs, self.config.gap_threshold);
        let reading = assemble_reading(&groups);
        debug!(
            "Region {}: {} glyphs, groups={:?}",
            index,
            glyphs.len(),
            groups
        );

        Ok(Some(reading))
    }
}
