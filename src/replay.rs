//! Session replay: remapping recorded points onto a new display surface and
//! progressively revealing annotations in sync with an audio clock.
//!
//! The recording surface and the replay surface can differ (replay may run
//! in a small embedded thumbnail), so every point goes through a
//! [`ReplayTransform`] built from the two [`ImageScaling`] placements.
//! Progress is a fraction in `[0, 1]`; whenever an audio clock is attached it
//! is authoritative — progress is the audio playback fraction, never an
//! independent timer.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use crate::geom::{ImageScaling, Point};
use crate::store::{Annotation, AnnotationKind};

/// Extra vertices shown ahead of the reveal fraction so polygons visibly
/// grow instead of popping in.
const VERTEX_LOOKAHEAD: usize = 1;

/// Free-running replay length when no audio clock is attached.
const FALLBACK_REPLAY_DURATION_MS: f64 = 30_000.0;

/// Per-axis affine map from recording-surface pixels to replay-surface
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ReplayTransform {
    /// The do-nothing transform (replaying on an identical surface).
    #[must_use]
    pub fn identity() -> Self {
        Self { scale_x: 1.0, scale_y: 1.0, offset_x: 0.0, offset_y: 0.0 }
    }

    /// Compose "recorded display → image → replay display" into one map.
    ///
    /// A degenerate recorded scale falls back to treating recorded points as
    /// image pixels rather than dividing by zero.
    #[must_use]
    pub fn between(recorded: &ImageScaling, display: &ImageScaling) -> Self {
        let (scale_x, offset_x) =
            axis_map(recorded.scale_x, recorded.offset_x, display.scale_x, display.offset_x);
        let (scale_y, offset_y) =
            axis_map(recorded.scale_y, recorded.offset_y, display.scale_y, display.offset_y);
        Self { scale_x, scale_y, offset_x, offset_y }
    }

    /// Map one recorded point onto the replay surface.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point {
            x: p.x.mul_add(self.scale_x, self.offset_x),
            y: p.y.mul_add(self.scale_y, self.offset_y),
        }
    }

    /// Clone an annotation with every point remapped.
    #[must_use]
    pub fn apply_annotation(&self, annotation: &Annotation) -> Annotation {
        let mut mapped = annotation.clone();
        mapped.points = annotation.points.iter().map(|&p| self.apply(p)).collect();
        mapped
    }
}

fn axis_map(rec_scale: f64, rec_offset: f64, disp_scale: f64, disp_offset: f64) -> (f64, f64) {
    let scale = if rec_scale == 0.0 { disp_scale } else { disp_scale / rec_scale };
    (scale, disp_offset - rec_offset * scale)
}

// ── Progressive reveal ──────────────────────────────────────────

/// Playback fraction of an audio clock; the duration guard keeps a missing
/// or zero-length clip at progress zero.
#[must_use]
pub fn progress_from_audio(current_time_s: f64, duration_s: f64) -> f64 {
    if duration_s <= 0.0 {
        return 0.0;
    }
    (current_time_s / duration_s).clamp(0.0, 1.0)
}

/// How many annotations are fully revealed at `progress`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn reveal_count(progress: f64, total: usize) -> usize {
    ((progress.clamp(0.0, 1.0) * total as f64).floor() as usize).min(total)
}

/// A partially revealed multi-point annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialReveal {
    /// Index into the timestamp-sorted annotation list.
    pub index: usize,
    /// Number of leading points to draw.
    pub visible_points: usize,
}

/// The reveal state at `progress`: `full` leading annotations drawn whole,
/// plus at most one growing multi-point annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSlice {
    pub full: usize,
    pub partial: Option<PartialReveal>,
}

/// Compute the reveal slice over a timestamp-sorted annotation list.
///
/// Discrete kinds (points, group markers) appear whole at their index.
/// Multi-point kinds grow vertex by vertex across their slot, with a small
/// lookahead so the growth is visible.
#[must_use]
pub fn reveal_slice(annotations: &[Annotation], progress: f64) -> RevealSlice {
    let total = annotations.len();
    let full = reveal_count(progress, total);
    if full >= total {
        return RevealSlice { full: total, partial: None };
    }

    #[allow(clippy::cast_precision_loss)]
    let position = progress.clamp(0.0, 1.0) * total as f64;
    #[allow(clippy::cast_precision_loss)]
    let fraction = position - full as f64;

    let candidate = &annotations[full];
    let n = candidate.points.len();
    let growable = !matches!(candidate.kind, AnnotationKind::Point | AnnotationKind::GroupMarker);
    if !growable || n < 2 {
        return RevealSlice { full, partial: None };
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let leading = (fraction * n as f64).ceil() as usize;
    let visible = (leading + VERTEX_LOOKAHEAD).min(n);
    if visible < 2 {
        return RevealSlice { full, partial: None };
    }
    RevealSlice { full, partial: Some(PartialReveal { index: full, visible_points: visible }) }
}

// ── Playback state machine ──────────────────────────────────────

/// Replay playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// A snapshot of the audio collaborator's seekable media element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioClock {
    pub current_time_s: f64,
    pub duration_s: f64,
}

/// Drives replay progress from either the audio clock or a free-running
/// timer, with drag-seek support.
///
/// While a seek is in progress the audio→progress feedback loop is
/// suspended so the scrubber doesn't fight incoming `timeupdate` events;
/// releasing the seek resumes it.
pub struct ReplayEngine {
    state: PlaybackState,
    progress: f64,
    seeking: bool,
    audio_attached: bool,
    fallback_duration_ms: f64,
    last_tick_ms: Option<f64>,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            progress: 0.0,
            seeking: false,
            audio_attached: false,
            fallback_duration_ms: FALLBACK_REPLAY_DURATION_MS,
            last_tick_ms: None,
        }
    }
}

impl ReplayEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-running replay length when no audio is attached.
    #[must_use]
    pub fn with_duration(duration_ms: f64) -> Self {
        Self { fallback_duration_ms: duration_ms.max(1.0), ..Self::default() }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    /// Declare that an audio clock will drive progress from now on.
    pub fn attach_audio(&mut self) {
        self.audio_attached = true;
    }

    /// Return to the free-running timer.
    pub fn detach_audio(&mut self) {
        self.audio_attached = false;
    }

    pub fn play(&mut self, now_ms: f64) {
        self.state = PlaybackState::Playing;
        self.last_tick_ms = Some(now_ms);
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
        self.last_tick_ms = None;
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.progress = 0.0;
        self.seeking = false;
        self.last_tick_ms = None;
    }

    /// Rewind to the start; `resume` keeps it playing.
    pub fn restart(&mut self, now_ms: f64, resume: bool) {
        self.progress = 0.0;
        if resume {
            self.play(now_ms);
        } else {
            self.state = PlaybackState::Stopped;
            self.last_tick_ms = None;
        }
    }

    /// A drag-seek started: suspend the audio feedback loop.
    pub fn begin_seek(&mut self) {
        self.seeking = true;
    }

    /// Jump to an arbitrary fraction.
    pub fn seek(&mut self, fraction: f64) {
        self.progress = fraction.clamp(0.0, 1.0);
    }

    /// The drag-seek ended: resume following the clock.
    pub fn end_seek(&mut self, now_ms: f64) {
        self.seeking = false;
        if self.state == PlaybackState::Playing {
            self.last_tick_ms = Some(now_ms);
        }
    }

    /// Adopt the audio clock's position. Audio is authoritative whenever
    /// attached — except mid-seek, where the user's scrubber wins.
    pub fn sync_to_audio(&mut self, clock: AudioClock) {
        if self.seeking {
            return;
        }
        self.progress = progress_from_audio(clock.current_time_s, clock.duration_s);
        if self.state == PlaybackState::Playing && self.progress >= 1.0 {
            self.state = PlaybackState::Stopped;
        }
    }

    /// Advance the free-running timer. A no-op while audio is attached,
    /// paused, stopped, or mid-seek. Returns the current progress.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        if self.state != PlaybackState::Playing || self.seeking || self.audio_attached {
            return self.progress;
        }
        let elapsed = self.last_tick_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_tick_ms = Some(now_ms);
        self.progress = (self.progress + elapsed / self.fallback_duration_ms).min(1.0);
        if self.progress >= 1.0 {
            self.state = PlaybackState::Stopped;
            self.last_tick_ms = None;
        }
        self.progress
    }
}
