//! Pure geometry: distances, trace metrics, hit primitives, and the
//! letterboxed image-to-display scaling used by the renderer and replay.
//!
//! Everything here is stateless and side-effect free. Trace metrics
//! (`path_length`, `max_extent`, `direction_changes`) feed the classifier;
//! the hit primitives back [`crate::hit`]; [`ImageScaling`] carries the
//! object-fit math that maps image pixels onto a display surface.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// Angle in radians a pair of consecutive segments must turn through to count
/// as a direction change.
pub const TURN_THRESHOLD: f64 = std::f64::consts::FRAC_PI_4;

/// A point in the coordinate space of whatever surface produced it.
///
/// Recording-canvas and display-surface points are never implicitly
/// convertible; go through [`ImageScaling`] or a replay transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Total length of an open polyline (sum of consecutive segment lengths).
#[must_use]
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Perimeter of a closed polygon (the closing edge is included).
#[must_use]
pub fn polygon_perimeter(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return path_length(vertices);
    }
    let closing = distance(vertices[vertices.len() - 1], vertices[0]);
    path_length(vertices) + closing
}

/// Axis-aligned bounding box of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// The larger of width and height — the scale metric used by the
    /// classifier, not a true diagonal.
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Grow the box by `pad` on every side.
    #[must_use]
    pub fn inflated(&self, pad: f64) -> Self {
        Self {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }
}

/// Bounding box of a trace, or `None` for an empty trace.
#[must_use]
pub fn bounding_box(points: &[Point]) -> Option<Bounds> {
    let first = points.first()?;
    let mut bounds = Bounds {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for p in &points[1..] {
        bounds.min_x = bounds.min_x.min(p.x);
        bounds.min_y = bounds.min_y.min(p.y);
        bounds.max_x = bounds.max_x.max(p.x);
        bounds.max_y = bounds.max_y.max(p.y);
    }
    Some(bounds)
}

/// `max(width, height)` of the trace's bounding box; `0.0` for traces with
/// fewer than two points.
#[must_use]
pub fn max_extent(points: &[Point]) -> f64 {
    bounding_box(points).map_or(0.0, |b| b.extent())
}

/// Count of consecutive segment pairs whose turn angle exceeds
/// [`TURN_THRESHOLD`] — a coarse corner counter.
///
/// Zero-length segments are skipped; the previous heading carries across
/// repeated points.
#[must_use]
pub fn direction_changes(points: &[Point]) -> usize {
    let mut count = 0;
    let mut prev_heading: Option<f64> = None;
    for w in points.windows(2) {
        let dx = w[1].x - w[0].x;
        let dy = w[1].y - w[0].y;
        if dx == 0.0 && dy == 0.0 {
            continue;
        }
        let heading = dy.atan2(dx);
        if let Some(prev) = prev_heading {
            let mut delta = heading - prev;
            while delta > std::f64::consts::PI {
                delta -= 2.0 * std::f64::consts::PI;
            }
            while delta < -std::f64::consts::PI {
                delta += 2.0 * std::f64::consts::PI;
            }
            if delta.abs() > TURN_THRESHOLD {
                count += 1;
            }
        }
        prev_heading = Some(heading);
    }
    count
}

/// Path length divided by bounding-box extent. A zero extent falls back to a
/// unit denominator so stationary traces stay finite.
#[must_use]
pub fn straightness(length: f64, extent: f64) -> f64 {
    let denom = if extent == 0.0 { 1.0 } else { extent };
    length / denom
}

// ── Hit primitives ──────────────────────────────────────────────

/// Whether `p` lies within `radius` of `center`.
#[must_use]
pub fn point_in_circle(p: Point, center: Point, radius: f64) -> bool {
    distance(p, center) <= radius
}

/// Shortest distance from `p` to the segment `a`–`b`, clamping the projection
/// to the segment body.
#[must_use]
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx.mul_add(abx, aby * aby);
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = ((p.x - a.x).mul_add(abx, (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    distance(p, Point::new(t.mul_add(abx, a.x), t.mul_add(aby, a.y)))
}

/// Whether `p` lies within `tolerance` of the segment `a`–`b`.
#[must_use]
pub fn point_near_segment(p: Point, a: Point, b: Point, tolerance: f64) -> bool {
    segment_distance(p, a, b) <= tolerance
}

/// Whether `p` lies inside the axis-aligned rectangle spanned by two opposite
/// corners (any corner order).
#[must_use]
pub fn point_in_rect(p: Point, corner_a: Point, corner_b: Point) -> bool {
    let min_x = corner_a.x.min(corner_b.x);
    let max_x = corner_a.x.max(corner_b.x);
    let min_y = corner_a.y.min(corner_b.y);
    let max_y = corner_a.y.max(corner_b.y);
    p.x >= min_x && p.x <= max_x && p.y >= min_y && p.y <= max_y
}

/// Even-odd (ray casting) point-in-polygon test. Polygons with fewer than
/// three vertices contain nothing.
#[must_use]
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        if ((vi.y > p.y) != (vj.y > p.y))
            && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether `p` lies within `tolerance` of any segment of an open polyline.
#[must_use]
pub fn point_near_polyline(p: Point, points: &[Point], tolerance: f64) -> bool {
    if points.len() == 1 {
        return point_in_circle(p, points[0], tolerance);
    }
    points
        .windows(2)
        .any(|w| point_near_segment(p, w[0], w[1], tolerance))
}

// ── Image scaling ───────────────────────────────────────────────

/// Object-fit "contain" placement of an image on a display surface.
///
/// `scale_x`/`scale_y` map image pixels to display pixels; `offset_x`/
/// `offset_y` center the letterboxed image within the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageScaling {
    pub display_width: f64,
    pub display_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ImageScaling {
    /// The identity placement: image pixels are display pixels.
    #[must_use]
    pub fn identity(width: f64, height: f64) -> Self {
        Self {
            display_width: width,
            display_height: height,
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Map an image-space point to display-surface coordinates.
    #[must_use]
    pub fn image_to_display(&self, p: Point) -> Point {
        Point {
            x: p.x.mul_add(self.scale_x, self.offset_x),
            y: p.y.mul_add(self.scale_y, self.offset_y),
        }
    }

    /// Invert [`ImageScaling::image_to_display`]. Degenerate scales map to
    /// the image origin rather than dividing by zero.
    #[must_use]
    pub fn display_to_image(&self, p: Point) -> Point {
        let x = if self.scale_x == 0.0 { 0.0 } else { (p.x - self.offset_x) / self.scale_x };
        let y = if self.scale_y == 0.0 { 0.0 } else { (p.y - self.offset_y) / self.scale_y };
        Point { x, y }
    }
}

/// Fit an image of `img_w`×`img_h` natural pixels into a container, keeping
/// aspect ratio and centering the constrained axis.
///
/// `max_height` optionally caps the usable container height (e.g. when a
/// toolbar reserves space below the canvas). Non-positive image dimensions
/// produce a zero-size placement.
#[must_use]
pub fn fit_image(
    img_w: f64,
    img_h: f64,
    container_w: f64,
    container_h: f64,
    max_height: Option<f64>,
) -> ImageScaling {
    let avail_h = max_height.map_or(container_h, |m| container_h.min(m));
    if img_w <= 0.0 || img_h <= 0.0 || container_w <= 0.0 || avail_h <= 0.0 {
        return ImageScaling {
            display_width: 0.0,
            display_height: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: 0.0,
            scale_y: 0.0,
        };
    }

    let scale = (container_w / img_w).min(avail_h / img_h);
    let display_width = img_w * scale;
    let display_height = img_h * scale;
    ImageScaling {
        display_width,
        display_height,
        offset_x: (container_w - display_width) / 2.0,
        offset_y: (avail_h - display_height) / 2.0,
        scale_x: scale,
        scale_y: scale,
    }
}

/// Convert a CSS-pixel point on a canvas element to canvas-pixel coordinates,
/// accounting for any CSS scaling of the element.
#[must_use]
pub fn css_to_canvas(p: Point, css_w: f64, css_h: f64, canvas_w: f64, canvas_h: f64) -> Point {
    let sx = if css_w == 0.0 { 1.0 } else { canvas_w / css_w };
    let sy = if css_h == 0.0 { 1.0 } else { canvas_h / css_h };
    Point { x: p.x * sx, y: p.y * sy }
}
