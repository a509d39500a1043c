// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Region extraction: detection boxes to cropped sub-images

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::Detection;

/// Errors raised while cropping a region
#[derive(Debug, Error, PartialEq)]
pub enum RegionError {
    #[error("Invalid region {left:.1},{top:.1} -> {right:.1},{bottom:.1}: {reason}")]
    InvalidRegion {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        reason: &'static str,
    },
}

/// Axis-aligned box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Convert a center/size detection into edges
    pub fn from_detection(detection: &Detection) -> Self {
        let half_w = detection.width / 2.0;
        let half_h = detection.height / 2.0;
        Self {
            left: detection.center_x - half_w,
            top: detection.center_y - half_h,
            right: detection.center_x + half_w,
            bottom: detection.center_y + half_h,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether the box has positive, finite extent
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0 && self.width().is_finite() && self.height().is_finite()
    }

    /// Round to whole pixels and clip to a `width` x `height` image.
    ///
    /// Returns `(x, y, w, h)`, or `None` when nothing of the box lies inside
    /// the image.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: f32, max: u32| v.round().clamp(0.0, max as f32) as u32;
        let x0 = clamp(self.left, width);
        let y0 = clamp(self.top, height);
        let x1 = clamp(self.right, width);
        let y1 = clamp(self.bottom, height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }

    fn invalid(&self, reason: &'static str) -> RegionError {
        RegionError::InvalidRegion {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            reason,
        }
    }
}

/// Crop the part of `image` covered by `bbox`
///
/// Boxes reaching past the image edges are clipped. Degenerate boxes and
/// boxes entirely outside the image are rejected.
pub fn crop_region(image: &DynamicImage, bbox: &BoundingBox) -> Result<DynamicImage, RegionError> {
    if !bbox.is_valid() {
        return Err(bbox.invalid("width and height must be positive"));
    }

    let (width, height) = image.dimensions();
    let (x, y, w, h) = bbox
        .to_pixel_rect(width, height)
        .ok_or_else(|| bbox.invalid("box lies outside the image"))?;

    Ok(image.crop_imm(x, y, w, h))
}
