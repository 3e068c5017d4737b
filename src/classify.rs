//! Heuristic gesture classification of point traces.
//!
//! A single pass over the trace accumulates path length, bounding-box extent,
//! and direction changes; a fixed, ordered rule set then maps the metrics to
//! a semantic label. The thresholds are empirically calibrated constants and
//! the rules are order-dependent — later rules are reached only when earlier
//! ones fail, so neither the values nor the ordering can be shuffled without
//! changing behavior.

#[cfg(test)]
#[path = "classify_test.rs"]
mod classify_test;

use serde::{Deserialize, Serialize};

use crate::consts::SAMPLE_INTERVAL_MS;
use crate::geom::{self, Point};

// Rule thresholds. Extents are in pixels of the recording surface.

/// Hover traces straighter than this read as a scan pass.
const SCAN_MAX_STRAIGHTNESS: f64 = 1.2;
/// Turn count above which a compact hover trace reads as scribbling.
const SCRIBBLE_MIN_TURNS: usize = 10;
/// Extent below which a trace counts as compact.
const COMPACT_EXTENT: f64 = 40.0;
/// Extent above which a turning hover trace reads as exploration.
const EXPLORE_MIN_EXTENT: f64 = 100.0;
/// Turn count above which a trace counts as wandering.
const WANDER_MIN_TURNS: usize = 5;
/// Minimum sample count for a framing gesture.
const FRAMING_MIN_POINTS: usize = 10;
/// Extent at or above which a turning active trace reads as an area sweep.
const AREA_MIN_EXTENT: f64 = 200.0;
/// Straightness ceiling for a framing gesture.
const FRAMING_MAX_STRAIGHTNESS: f64 = 2.0;
/// Turn count above which a compact active trace reads as a focal point.
const FOCAL_MIN_TURNS: usize = 8;
/// Straightness ceiling for a curve gesture.
const CURVE_MAX_STRAIGHTNESS: f64 = 2.5;

/// Semantic label assigned to a classified trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureKind {
    /// Degenerate trace (fewer than two samples).
    #[serde(rename = "point")]
    Point,
    /// Mid-size enclosing motion outlining a region of interest.
    #[serde(rename = "framing")]
    Framing,
    /// Tight repeated motion concentrated on one spot.
    #[serde(rename = "focal point")]
    FocalPoint,
    /// Large sweeping motion covering a broad region.
    #[serde(rename = "area")]
    Area,
    /// Smooth low-turn stroke following a contour.
    #[serde(rename = "curve")]
    Curve,
    /// Active trace matching no rule.
    #[serde(rename = "unclassified")]
    Unclassified,
    /// Near-straight hover pass across the image.
    #[serde(rename = "hover-scan")]
    HoverScan,
    /// Tight jittery hover motion.
    #[serde(rename = "hover-scribble")]
    HoverScribble,
    /// Wide wandering hover with many turns.
    #[serde(rename = "hover-explore")]
    HoverExplore,
    /// Hover matching no earlier rule.
    #[serde(rename = "hover-meander")]
    HoverMeander,
}

impl GestureKind {
    /// The stable string form used on the wire and in session bundles.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Framing => "framing",
            Self::FocalPoint => "focal point",
            Self::Area => "area",
            Self::Curve => "curve",
            Self::Unclassified => "unclassified",
            Self::HoverScan => "hover-scan",
            Self::HoverScribble => "hover-scribble",
            Self::HoverExplore => "hover-explore",
            Self::HoverMeander => "hover-meander",
        }
    }

    /// Whether this label came from a hover trace.
    #[must_use]
    pub fn is_hover(self) -> bool {
        matches!(
            self,
            Self::HoverScan | Self::HoverScribble | Self::HoverExplore | Self::HoverMeander
        )
    }
}

/// Metrics accumulated over a trace at classification time. Stored on the
/// annotation and never recomputed later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceMetrics {
    /// Estimated duration in milliseconds (`samples × 16`, assuming ~60 Hz).
    pub duration_ms: f64,
    /// Total path length in pixels.
    pub length: f64,
    /// Larger axis of the bounding box, in pixels.
    pub bounding_box: f64,
    /// Count of turns sharper than 45°.
    pub direction_changes: usize,
}

impl TraceMetrics {
    /// All-zero metrics for degenerate traces.
    #[must_use]
    pub fn zero() -> Self {
        Self { duration_ms: 0.0, length: 0.0, bounding_box: 0.0, direction_changes: 0 }
    }
}

/// A classified trace: the label plus the metrics that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: GestureKind,
    pub metrics: TraceMetrics,
}

/// Classify a raw point trace.
///
/// `is_hover` selects the hover rule set (pointer up, tracking attention)
/// over the active rule set (pointer down, deliberate drawing). Classifying
/// the same trace twice yields the same result.
#[must_use]
pub fn classify(points: &[Point], is_hover: bool) -> Classification {
    if points.len() < 2 {
        return Classification { kind: GestureKind::Point, metrics: TraceMetrics::zero() };
    }

    let length = geom::path_length(points);
    let direction_changes = geom::direction_changes(points);
    let bounding_box = geom::max_extent(points);
    #[allow(clippy::cast_precision_loss)]
    let duration_ms = points.len() as f64 * SAMPLE_INTERVAL_MS;
    let straightness = geom::straightness(length, bounding_box);

    let metrics = TraceMetrics { duration_ms, length, bounding_box, direction_changes };
    let kind = if is_hover {
        classify_hover(bounding_box, direction_changes, straightness)
    } else {
        classify_active(points.len(), bounding_box, direction_changes, straightness)
    };
    Classification { kind, metrics }
}

fn classify_hover(bounding_box: f64, direction_changes: usize, straightness: f64) -> GestureKind {
    if straightness < SCAN_MAX_STRAIGHTNESS {
        GestureKind::HoverScan
    } else if direction_changes > SCRIBBLE_MIN_TURNS && bounding_box < COMPACT_EXTENT {
        GestureKind::HoverScribble
    } else if bounding_box > EXPLORE_MIN_EXTENT && direction_changes > WANDER_MIN_TURNS {
        GestureKind::HoverExplore
    } else {
        GestureKind::HoverMeander
    }
}

fn classify_active(
    samples: usize,
    bounding_box: f64,
    direction_changes: usize,
    straightness: f64,
) -> GestureKind {
    if samples > FRAMING_MIN_POINTS
        && bounding_box > COMPACT_EXTENT
        && bounding_box < AREA_MIN_EXTENT
        && direction_changes > WANDER_MIN_TURNS
        && straightness < FRAMING_MAX_STRAIGHTNESS
    {
        GestureKind::Framing
    } else if bounding_box < COMPACT_EXTENT && direction_changes > FOCAL_MIN_TURNS {
        GestureKind::FocalPoint
    } else if bounding_box >= AREA_MIN_EXTENT && direction_changes > WANDER_MIN_TURNS {
        GestureKind::Area
    } else if direction_changes <= WANDER_MIN_TURNS
        && bounding_box > COMPACT_EXTENT
        && straightness < CURVE_MAX_STRAIGHTNESS
    {
        GestureKind::Curve
    } else {
        GestureKind::Unclassified
    }
}
