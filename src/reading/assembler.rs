// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reading assembly from glyph groups

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Structured reading for one counter region
///
/// The leftmost group is the small top-left readout; every group after it
/// forms the main reading.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Reading {
    /// First group, `null` when no glyphs were found
    pub top_left_reading: Option<String>,
    /// Remaining groups concatenated without separator
    pub main_reading: String,
}

/// Build a reading from groups in left-to-right order
pub fn assemble_reading(groups: &[String]) -> Reading {
    match groups.split_first() {
        Some((first, rest)) => Reading {
            top_left_reading: Some(first.clone()),
            main_reading: rest.concat(),
        },
        None => Reading {
            top_left_reading: None,
            main_reading: String::new(),
        },
    }
}

/// Readings for every region of one image, in detection order
///
/// Serializes as a JSON object keyed `Reading_<index>`, where `index` is the
/// region's position in the detection list. Regions without a reading are
/// absent, so indices may have gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingSet {
    entries: Vec<(usize, Reading)>,
}

impl ReadingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the reading of the region at `index`
    pub fn insert(&mut self, index: usize, reading: Reading) {
        self.entries.push((index, reading));
    }

    /// Look up the reading of a region
    pub fn get(&self, index: usize) -> Option<&Reading> {
        self.entries
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, reading)| reading)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, reading)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (String, &Reading)> {
        self.entries
            .iter()
            .map(|(index, reading)| (reading_key(*index), reading))
    }
}

/// Response key for a region index
pub fn reading_key(index: usize) -> String {
    format!("Reading_{}", index)
}

impl Serialize for ReadingSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, reading) in self.iter() {
            map.serialize_entry(&key, reading)?;
        }
        map.end()
    }
}
