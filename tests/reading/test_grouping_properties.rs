// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Grouping and assembly behaviour over whole glyph sets

use fabstir_meter_reader::{
    assemble_reading, group_glyphs, resolve_label,
    reading::{reading_key, GLYPH_LABELS, UNKNOWN_LABEL},
    Detection, Glyph, Reading,
};

fn glyphs(xs: &[f32], labels: &[&str]) -> Vec<Glyph> {
    xs.iter()
        .zip(labels)
        .map(|(x, label)| Glyph::new(*x, *label))
        .collect()
}

/// Number of adjacent sorted pairs whose gap exceeds the threshold
fn gaps_over(xs: &[f32], threshold: f32) -> usize {
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() > threshold)
        .count()
}

#[test]
fn test_meter_scenario() {
    let groups = group_glyphs(
        &glyphs(&[5.0, 8.0, 12.0, 40.0, 43.0], &["1", "2", "3", ".", "4"]),
        20.0,
    );
    assert_eq!(groups, vec!["123", ".4"]);

    let reading = assemble_reading(&groups);
    assert_eq!(reading.top_left_reading.as_deref(), Some("123"));
    assert_eq!(reading.main_reading, ".4");
}

#[test]
fn test_scenario_is_order_independent() {
    let shuffled = glyphs(&[43.0, 12.0, 5.0, 40.0, 8.0], &["4", "3", "1", ".", "2"]);
    assert_eq!(group_glyphs(&shuffled, 20.0), vec!["123", ".4"]);
}

#[test]
fn test_group_count_matches_gaps() {
    let cases: &[&[f32]] = &[
        &[0.0],
        &[0.0, 20.0, 40.0],
        &[0.0, 21.0, 42.0],
        &[100.0, 3.0, 50.0, 52.0, 200.0],
        &[-30.0, -5.0, 0.0, 18.0],
    ];
    for xs in cases {
        let labels = vec!["1"; xs.len()];
        let groups = group_glyphs(&glyphs(xs, &labels), 20.0);
        assert_eq!(groups.len(), gaps_over(xs, 20.0) + 1, "xs = {:?}", xs);
        assert_eq!(groups.concat().len(), xs.len());
    }
}

#[test]
fn test_gap_equal_to_threshold_does_not_split() {
    let groups = group_glyphs(&glyphs(&[10.0, 30.0], &["5", "6"]), 20.0);
    assert_eq!(groups, vec!["56"]);
}

#[test]
fn test_regrouping_sorted_output_is_stable() {
    let input = glyphs(&[60.0, 1.0, 90.0, 3.0, 5.0], &["7", "1", "8", "2", "3"]);
    let first = group_glyphs(&input, 20.0);

    let mut sorted = input.clone();
    sorted.sort_by(|a, b| a.center_x.total_cmp(&b.center_x));
    assert_eq!(group_glyphs(&sorted, 20.0), first);
    assert_eq!(first, vec!["123", "7", "8"]);
}

#[test]
fn test_zero_threshold_splits_every_distinct_position() {
    let groups = group_glyphs(&glyphs(&[1.0, 1.0, 2.0], &["4", "5", "6"]), 0.0);
    assert_eq!(groups, vec!["45", "6"]);
}

#[test]
fn test_three_groups_join_main_reading() {
    let groups = group_glyphs(
        &glyphs(&[0.0, 50.0, 52.0, 100.0, 103.0], &["9", "0", "1", ".", "5"]),
        20.0,
    );
    assert_eq!(
        assemble_reading(&groups),
        Reading {
            top_left_reading: Some("9".to_string()),
            main_reading: "01.5".to_string(),
        }
    );
}

#[test]
fn test_empty_and_single_glyph() {
    let empty = assemble_reading(&group_glyphs(&[], 20.0));
    assert_eq!(empty.top_left_reading, None);
    assert_eq!(empty.main_reading, "");

    let single = assemble_reading(&group_glyphs(&glyphs(&[7.0], &["3"]), 20.0));
    assert_eq!(single.top_left_reading.as_deref(), Some("3"));
    assert_eq!(single.main_reading, "");
}

#[test]
fn test_labels_from_detections() {
    let detections = vec![
        Detection::new(5.0, 0.0, 2.0, 2.0).with_class_id(1),
        Detection::new(9.0, 0.0, 2.0, 2.0).with_class_id(0),
        Detection::new(12.0, 0.0, 2.0, 2.0).with_class_id(10),
        Detection::new(15.0, 0.0, 2.0, 2.0).with_class_id(42),
    ];
    let glyphs: Vec<Glyph> = detections.iter().map(Glyph::from).collect();
    assert_eq!(
        group_glyphs(&glyphs, 20.0),
        vec![format!("0.9{}", UNKNOWN_LABEL)]
    );
}

#[test]
fn test_label_table() {
    for (id, label) in GLYPH_LABELS.iter().enumerate() {
        assert_eq!(resolve_label(Some(id as i64)), *label);
    }
    assert_eq!(resolve_label(None), UNKNOWN_LABEL);
    assert_eq!(resolve_label(Some(-1)), UNKNOWN_LABEL);
    assert_eq!(resolve_label(Some(11)), UNKNOWN_LABEL);
}

#[test]
fn test_reading_keys() {
    assert_eq!(reading_key(0), "Reading_0");
    assert_eq!(reading_key(12), "Reading_12");
}
