//! Hit-testing selection clicks against committed annotations.
//!
//! Dispatches on the annotation kind to the matching [`crate::geom`]
//! primitive. All coordinates are recording-canvas pixels; the engine
//! converts pointer positions before calling in.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::HIT_RADIUS_PX;
use crate::geom::{self, Point};
use crate::store::{Annotation, AnnotationId, AnnotationKind};

/// Whether `at` hits one annotation, using the default hit slop.
#[must_use]
pub fn annotation_contains(annotation: &Annotation, at: Point) -> bool {
    annotation_contains_with_radius(annotation, at, HIT_RADIUS_PX)
}

/// Whether `at` hits one annotation within `radius` pixels of slop.
#[must_use]
pub fn annotation_contains_with_radius(annotation: &Annotation, at: Point, radius: f64) -> bool {
    let points = &annotation.points;
    match annotation.kind {
        AnnotationKind::GroupMarker => false,
        AnnotationKind::Point => {
            points.first().is_some_and(|&center| geom::point_in_circle(at, center, radius))
        }
        AnnotationKind::Line => {
            points.len() >= 2 && geom::point_near_segment(at, points[0], points[1], radius)
        }
        AnnotationKind::Frame | AnnotationKind::Area => {
            if points.len() >= 3 {
                // Inside counts, and so does the outline within slop — a
                // frame's interior may be mostly empty image.
                geom::point_in_polygon(at, points) || near_closed_outline(at, points, radius)
            } else if points.len() == 2 {
                geom::point_in_rect(at, points[0], points[1])
            } else {
                false
            }
        }
        AnnotationKind::Freehand | AnnotationKind::Hover => {
            !points.is_empty() && geom::point_near_polyline(at, points, radius)
        }
    }
}

fn near_closed_outline(at: Point, vertices: &[Point], radius: f64) -> bool {
    if geom::point_near_polyline(at, vertices, radius) {
        return true;
    }
    let first = vertices[0];
    let last = vertices[vertices.len() - 1];
    geom::point_near_segment(at, last, first, radius)
}

/// Find the topmost annotation under `at`.
///
/// Newest-first by timestamp, mirroring draw order: the annotation painted
/// last is the one the user sees on top and means to pick.
#[must_use]
pub fn hit_test(at: Point, annotations: &[Annotation]) -> Option<AnnotationId> {
    let mut sorted: Vec<&Annotation> = annotations.iter().collect();
    sorted.sort_by(|a, b| b.timestamp_ms.total_cmp(&a.timestamp_ms));
    sorted
        .into_iter()
        .find(|a| annotation_contains(a, at))
        .map(|a| a.id)
}
