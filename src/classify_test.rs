#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

/// Sawtooth along x: `n` vertices spaced `step` apart, alternating y between
/// 0 and `amplitude`. Every interior vertex is a sharp turn.
fn sawtooth(n: usize, step: f64, amplitude: f64) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let y = if i % 2 == 0 { 0.0 } else { amplitude };
            Point::new(i as f64 * step, y)
        })
        .collect()
}

// --- degenerate traces ---

#[test]
fn empty_trace_is_point() {
    let c = classify(&[], false);
    assert_eq!(c.kind, GestureKind::Point);
    assert_eq!(c.metrics, TraceMetrics::zero());
}

#[test]
fn single_sample_is_point_even_for_hover() {
    let c = classify(&pts(&[(10.0, 10.0)]), true);
    assert_eq!(c.kind, GestureKind::Point);
    assert_eq!(c.metrics.length, 0.0);
    assert_eq!(c.metrics.duration_ms, 0.0);
}

// --- metrics ---

#[test]
fn duration_is_sample_count_times_sixteen() {
    let trace = sawtooth(15, 10.0, 7.5);
    let c = classify(&trace, false);
    assert_eq!(c.metrics.duration_ms, 240.0);
}

#[test]
fn metrics_record_length_extent_and_turns() {
    let trace = sawtooth(15, 10.0, 7.5);
    let c = classify(&trace, false);
    assert_eq!(c.metrics.direction_changes, 13);
    assert_eq!(c.metrics.bounding_box, 140.0);
    assert!(c.metrics.length > 140.0);
}

#[test]
fn classification_is_idempotent() {
    let trace = sawtooth(12, 25.0, 60.0);
    let a = classify(&trace, false);
    let b = classify(&trace, false);
    assert_eq!(a.kind, b.kind);
    assert_eq!(a.metrics, b.metrics);
}

#[test]
fn stationary_hover_trace_is_finite() {
    // Six identical samples: zero length, zero extent. The zero-extent guard
    // keeps straightness finite (0), which reads as a scan.
    let trace = pts(&[(5.0, 5.0); 6]);
    let c = classify(&trace, true);
    assert_eq!(c.kind, GestureKind::HoverScan);
    assert_eq!(c.metrics.length, 0.0);
    assert_eq!(c.metrics.bounding_box, 0.0);
}

// --- active rules ---

#[test]
fn framing_matches_mid_size_enclosing_motion() {
    // 15 samples, extent 140, 13 sharp turns, straightness = 1.25.
    let trace = sawtooth(15, 10.0, 7.5);
    let c = classify(&trace, false);
    assert_eq!(c.kind, GestureKind::Framing);
    assert!(c.metrics.bounding_box > 40.0 && c.metrics.bounding_box < 200.0);
    assert!(c.metrics.direction_changes > 5);
}

#[test]
fn focal_point_matches_tight_turning_motion() {
    let trace = pts(&[
        (0.0, 0.0),
        (10.0, 10.0),
        (0.0, 5.0),
        (10.0, 0.0),
        (0.0, 10.0),
        (10.0, 5.0),
        (0.0, 0.0),
        (10.0, 10.0),
        (0.0, 5.0),
        (10.0, 0.0),
        (0.0, 10.0),
        (10.0, 5.0),
    ]);
    let c = classify(&trace, false);
    assert!(c.metrics.bounding_box < 40.0);
    assert!(c.metrics.direction_changes > 8);
    assert_eq!(c.kind, GestureKind::FocalPoint);
}

#[test]
fn area_matches_large_turning_sweep() {
    let trace = pts(&[
        (0.0, 0.0),
        (250.0, 250.0),
        (0.0, 125.0),
        (250.0, 0.0),
        (0.0, 250.0),
        (250.0, 125.0),
        (0.0, 0.0),
        (250.0, 250.0),
        (0.0, 125.0),
    ]);
    let c = classify(&trace, false);
    assert!(c.metrics.bounding_box >= 200.0);
    assert!(c.metrics.direction_changes > 5);
    assert_eq!(c.kind, GestureKind::Area);
}

#[test]
fn curve_matches_smooth_arc() {
    // Semicircle of radius 50: no sharp turns, straightness ≈ π/2.
    let trace: Vec<Point> = (0..12)
        .map(|i| {
            let theta = std::f64::consts::PI * i as f64 / 11.0;
            Point::new(50.0 * theta.cos(), 50.0 * theta.sin())
        })
        .collect();
    let c = classify(&trace, false);
    assert_eq!(c.metrics.direction_changes, 0);
    assert!(c.metrics.bounding_box > 40.0);
    assert_eq!(c.kind, GestureKind::Curve);
}

#[test]
fn straight_stroke_reads_as_curve() {
    // A ruler-straight drag satisfies the curve rule (low turns, wide, taut).
    let trace = pts(&[(0.0, 0.0), (30.0, 0.0), (60.0, 0.0), (90.0, 0.0)]);
    assert_eq!(classify(&trace, false).kind, GestureKind::Curve);
}

#[test]
fn short_flat_stroke_is_unclassified() {
    let trace = pts(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
    assert_eq!(classify(&trace, false).kind, GestureKind::Unclassified);
}

#[test]
fn extent_of_exactly_forty_is_unclassified() {
    // Strict inequalities: 40 px is neither compact (< 40) nor framing-sized
    // (> 40).
    let trace = pts(&[
        (0.0, 0.0),
        (40.0, 40.0),
        (0.0, 20.0),
        (40.0, 0.0),
        (0.0, 40.0),
        (40.0, 20.0),
        (0.0, 0.0),
        (40.0, 40.0),
        (0.0, 20.0),
        (40.0, 0.0),
    ]);
    let c = classify(&trace, false);
    assert_eq!(c.metrics.bounding_box, 40.0);
    assert_eq!(c.kind, GestureKind::Unclassified);
}

#[test]
fn framing_is_checked_before_focal_point() {
    // A trace matching framing must not fall through even though it also
    // turns a lot.
    let trace = sawtooth(15, 10.0, 7.5);
    assert_eq!(classify(&trace, false).kind, GestureKind::Framing);
}

// --- hover rules ---

#[test]
fn near_straight_hover_is_scan() {
    let trace = pts(&[(0.0, 0.0), (50.0, 1.0), (100.0, 2.0), (150.0, 3.0)]);
    assert_eq!(classify(&trace, true).kind, GestureKind::HoverScan);
}

#[test]
fn tight_jitter_hover_is_scribble() {
    let trace = pts(&[
        (0.0, 0.0),
        (10.0, 10.0),
        (0.0, 5.0),
        (10.0, 0.0),
        (0.0, 10.0),
        (10.0, 5.0),
        (0.0, 0.0),
        (10.0, 10.0),
        (0.0, 5.0),
        (10.0, 0.0),
        (0.0, 10.0),
        (10.0, 5.0),
        (0.0, 0.0),
        (10.0, 10.0),
    ]);
    let c = classify(&trace, true);
    assert!(c.metrics.direction_changes > 10);
    assert!(c.metrics.bounding_box < 40.0);
    assert_eq!(c.kind, GestureKind::HoverScribble);
}

#[test]
fn wide_turning_hover_is_explore() {
    let trace = pts(&[
        (0.0, 0.0),
        (150.0, 150.0),
        (0.0, 75.0),
        (150.0, 0.0),
        (0.0, 150.0),
        (150.0, 75.0),
        (0.0, 0.0),
        (150.0, 150.0),
    ]);
    let c = classify(&trace, true);
    assert!(c.metrics.bounding_box > 100.0);
    assert!(c.metrics.direction_changes > 5);
    assert_eq!(c.kind, GestureKind::HoverExplore);
}

#[test]
fn moderate_hover_falls_through_to_meander() {
    let trace = pts(&[(0.0, 0.0), (60.0, 5.0), (0.0, 10.0), (60.0, 15.0)]);
    assert_eq!(classify(&trace, true).kind, GestureKind::HoverMeander);
}

#[test]
fn scan_rule_wins_over_explore_for_straight_hovers() {
    // Wide and near-straight: both scan and (extent-wise) explore could
    // apply, but scan is checked first.
    let trace = pts(&[(0.0, 0.0), (120.0, 0.0), (240.0, 1.0), (360.0, 2.0)]);
    assert_eq!(classify(&trace, true).kind, GestureKind::HoverScan);
}

#[test]
fn hover_flag_switches_rule_sets() {
    let trace = sawtooth(15, 10.0, 7.5);
    assert_eq!(classify(&trace, false).kind, GestureKind::Framing);
    // Same trace hovered: straightness 1.25 ≥ 1.2, turns 13 > 10 but extent
    // 140 ≥ 40, extent 140 > 100 with turns > 5 → explore.
    assert_eq!(classify(&trace, true).kind, GestureKind::HoverExplore);
}

// --- labels / serde ---

#[test]
fn labels_match_wire_form() {
    assert_eq!(GestureKind::FocalPoint.label(), "focal point");
    assert_eq!(GestureKind::HoverScan.label(), "hover-scan");
    assert_eq!(GestureKind::Unclassified.label(), "unclassified");
}

#[test]
fn kind_serde_roundtrip() {
    let json = serde_json::to_string(&GestureKind::FocalPoint).unwrap();
    assert_eq!(json, "\"focal point\"");
    let back: GestureKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, GestureKind::FocalPoint);
}

#[test]
fn hover_kinds_know_they_are_hover() {
    assert!(GestureKind::HoverMeander.is_hover());
    assert!(!GestureKind::Framing.is_hover());
}
