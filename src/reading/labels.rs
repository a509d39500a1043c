// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Glyph class labels for the digit segmentation model

/// Label emitted for class ids outside the table
pub const UNKNOWN_LABEL: &str = "unknown";

/// Class id -> glyph. Id 0 is the decimal point, ids 1-10 are digits 0-9.
pub const GLYPH_LABELS: [&str; 11] = [".", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Resolve a model class id to its glyph
///
/// Missing or unmapped ids resolve to [`UNKNOWN_LABEL`].
pub fn resolve_label(class_id: Option<i64>) -> &'static str {
    class_id
        .and_then(|id| usize::try_from(id).ok())
        .and_then(|id| GLYPH_LABELS.get(id).copied())
        .unwrap_or(UNKNOWN_LABEL)
}
