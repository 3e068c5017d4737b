#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::store::{NewAnnotation, SessionStore};

fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn ann(kind: AnnotationKind, coords: &[(f64, f64)], ts: f64) -> Annotation {
    let mut store = SessionStore::new();
    let id = store
        .add_annotation(NewAnnotation::plain(kind, pts(coords), "#D94B4B".to_owned()), ts)
        .unwrap();
    store.get(&id).unwrap().clone()
}

// --- per-kind containment ---

#[test]
fn point_hit_within_radius() {
    let a = ann(AnnotationKind::Point, &[(100.0, 100.0)], 1.0);
    assert!(annotation_contains(&a, Point::new(110.0, 100.0)));
    assert!(!annotation_contains(&a, Point::new(120.0, 100.0)));
}

#[test]
fn line_hit_near_segment() {
    let a = ann(AnnotationKind::Line, &[(0.0, 0.0), (100.0, 0.0)], 1.0);
    assert!(annotation_contains(&a, Point::new(50.0, 10.0)));
    assert!(!annotation_contains(&a, Point::new(50.0, 20.0)));
}

#[test]
fn polygon_hit_inside() {
    let a = ann(
        AnnotationKind::Frame,
        &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
        1.0,
    );
    assert!(annotation_contains(&a, Point::new(50.0, 50.0)));
    assert!(!annotation_contains(&a, Point::new(200.0, 50.0)));
}

#[test]
fn polygon_hit_on_closing_edge() {
    // The edge from the last vertex back to the first is hit-testable too.
    let a = ann(AnnotationKind::Area, &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)], 1.0);
    // Near the hypotenuse midpoint (50, 50), just outside the triangle.
    assert!(annotation_contains(&a, Point::new(45.0, 55.0)));
}

#[test]
fn legacy_rect_hit_inside() {
    let a = ann(AnnotationKind::Frame, &[(10.0, 10.0), (60.0, 40.0)], 1.0);
    assert!(annotation_contains(&a, Point::new(30.0, 20.0)));
    assert!(!annotation_contains(&a, Point::new(70.0, 20.0)));
}

#[test]
fn freehand_hit_near_any_segment() {
    let a = ann(AnnotationKind::Freehand, &[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)], 1.0);
    assert!(annotation_contains(&a, Point::new(55.0, 25.0)));
    assert!(!annotation_contains(&a, Point::new(0.0, 50.0)));
}

#[test]
fn hover_hit_uses_polyline() {
    let a = ann(
        AnnotationKind::Hover,
        &[(0.0, 0.0), (20.0, 0.0), (40.0, 0.0), (60.0, 0.0), (80.0, 0.0), (100.0, 0.0)],
        1.0,
    );
    assert!(annotation_contains(&a, Point::new(50.0, 10.0)));
}

#[test]
fn custom_radius_is_respected() {
    let a = ann(AnnotationKind::Point, &[(0.0, 0.0)], 1.0);
    assert!(annotation_contains_with_radius(&a, Point::new(4.0, 0.0), 5.0));
    assert!(!annotation_contains_with_radius(&a, Point::new(6.0, 0.0), 5.0));
}

// --- topmost dispatch ---

#[test]
fn hit_test_picks_newest_overlapping() {
    let older = ann(AnnotationKind::Point, &[(50.0, 50.0)], 100.0);
    let newer = ann(AnnotationKind::Point, &[(52.0, 50.0)], 200.0);
    let id = hit_test(Point::new(51.0, 50.0), &[older.clone(), newer.clone()]).unwrap();
    assert_eq!(id, newer.id);
}

#[test]
fn hit_test_falls_through_to_lower_annotation() {
    let bottom = ann(AnnotationKind::Point, &[(50.0, 50.0)], 100.0);
    let top = ann(AnnotationKind::Point, &[(500.0, 500.0)], 200.0);
    let id = hit_test(Point::new(50.0, 50.0), &[bottom.clone(), top]).unwrap();
    assert_eq!(id, bottom.id);
}

#[test]
fn hit_test_empty_space_is_none() {
    let a = ann(AnnotationKind::Point, &[(50.0, 50.0)], 100.0);
    assert!(hit_test(Point::new(300.0, 300.0), &[a]).is_none());
}
