//! Shared numeric constants for the annotation engine.

// ── Timing ──────────────────────────────────────────────────────

/// Hold time in milliseconds separating a dwell from a quick tap.
pub const DWELL_MS: f64 = 400.0;

/// Idle time in milliseconds after which a hover trace fades out and is
/// finalized.
pub const HOVER_FADE_MS: f64 = 1200.0;

/// Assumed pointer sampling interval (~60 Hz). Trace duration estimates are
/// `point count × this` — an approximation, not a measured duration.
pub const SAMPLE_INTERVAL_MS: f64 = 16.0;

/// Seconds counted down before a recording session goes live.
pub const COUNTDOWN_START: u32 = 3;

// ── Input thresholds ────────────────────────────────────────────

/// Pointer travel in pixels before a press becomes a drag.
pub const MOVE_THRESHOLD_PX: f64 = 8.0;

/// Minimum drag extent in pixels for a drag gesture to commit an annotation.
pub const MIN_DRAG_DISTANCE_PX: f64 = 8.0;

/// Click slop in pixels around the first vertex that closes a polygon.
pub const POLYGON_CLOSE_RADIUS_PX: f64 = 10.0;

/// Screen-space hit slop in pixels when selecting committed annotations.
pub const HIT_RADIUS_PX: f64 = 15.0;

/// Hover traces with at most this many points are discarded unclassified.
pub const HOVER_MIN_POINTS: usize = 5;

// ── Presentation ────────────────────────────────────────────────

/// Nominal perimeter assigned to zero-extent marks (points, group markers).
pub const POINT_PERIMETER: f64 = 5.0;

/// Radius in pixels of a committed point marker.
pub const POINT_RADIUS_PX: f64 = 5.0;

/// Stroke color used for selection overlays.
pub const SELECTION_COLOR: &str = "#1E90FF";

/// The fixed annotation color palette offered at creation time.
pub const PALETTE: [&str; 5] = ["#D94B4B", "#1E90FF", "#4AD981", "#E6A23C", "#1F1A17"];

/// Color assigned to new annotations until the user picks another.
pub const DEFAULT_COLOR: &str = PALETTE[0];
