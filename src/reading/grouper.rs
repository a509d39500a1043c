// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Glyph grouping
//!
//! Clusters glyph detections along the x-axis: glyphs are sorted left to
//! right and a new group starts wherever the distance to the previous glyph
//! exceeds the gap threshold. Each group is emitted as the concatenation of
//! its labels.

use serde::{Deserialize, Serialize};

use super::labels::resolve_label;
use crate::detection::Detection;

/// A single character detected inside a counter region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Horizontal center of the glyph box
    pub center_x: f32,
    /// Resolved character ("0"-"9", "." or "unknown")
    pub label: String,
}

impl Glyph {
    pub fn new(center_x: f32, label: impl Into<String>) -> Self {
        Self {
            center_x,
            label: label.into(),
        }
    }
}

impl From<&Detection> for Glyph {
    fn from(detection: &Detection) -> Self {
        Self::new(detection.center_x, resolve_label(detection.class_id))
    }
}

/// Group glyphs into left-to-right runs
///
/// Sorting is stable, so glyphs sharing a `center_x` keep their input order.
/// An empty slice yields no groups.
pub fn group_glyphs(glyphs: &[Glyph], gap_threshold: f32) -> Vec<String> {
    let mut sorted: Vec<&Glyph> = glyphs.iter().collect();
    sorted.sort_by(|a, b| a.center_x.total_cmp(&b.center_x));

    let mut groups = Vec::new();
    let mut current_group = String::new();
    let mut last_x: Option<f32> = None;

    for glyph in sorted {
        if let Some(prev) = last_x {
            if (glyph.center_x - prev).abs() > gap_threshold {
                groups.push(std::mem::take(&mut current_group));
            }
        }
        current_group.push_str(&glyph.label);
        last_x = Some(glyph.center_x);
    }

    if last_x.is_some() {
        groups.push(current_group);
    }

    groups
}
