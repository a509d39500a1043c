// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reading reconstruction from glyph detections
//!
//! Components:
//! - `labels` - class id to glyph table
//! - `grouper` - x-axis gap clustering of glyphs
//! - `assembler` - top-left/main reading and the per-image reading set

pub mod assembler;
pub mod grouper;
pub mod labels;

pub use assembler::{assemble_reading, reading_key, Reading, ReadingSet};
pub use grouper::{group_glyphs, Glyph};
pub use labels::{resolve_label, GLYPH_LABELS, UNKNOWN_LABEL};
