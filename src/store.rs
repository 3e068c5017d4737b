//! Session model: annotations, groups, and the in-memory store.
//!
//! This module defines the core data types recorded during a session
//! (`Annotation`, `AnnotationKind`, `Group`), a sparse-update type for the
//! two mutable fields (`AnnotationPatch`), and the runtime store that owns
//! the session (`SessionStore`).
//!
//! Annotations flow into this layer exclusively from the input engine; the
//! renderer and replay read from it. Timestamp ordering is the single source
//! of truth for "what happened when" — undo, grouping, the derived trace
//! timeline, and replay all key off it.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{GestureKind, TraceMetrics};
use crate::consts::{COUNTDOWN_START, POINT_PERIMETER};
use crate::geom::{self, Bounds, Point};

/// Unique identifier for an annotation.
pub type AnnotationId = Uuid;

/// Unique identifier for a group.
pub type GroupId = Uuid;

/// The kind of a recorded annotation.
///
/// `select` is a transient tool mode, not a stored kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// A single tapped or dwelled location.
    Point,
    /// A two-point straight segment.
    Line,
    /// An outlined region: ≥3 polygon vertices, or a legacy 2-point rectangle.
    Frame,
    /// A filled region: same vertex rules as `Frame`.
    Area,
    /// A classified freehand stroke.
    Freehand,
    /// A classified hover trail (pointer up).
    Hover,
    /// Synthetic marker kind used for group-creation entries in the timeline.
    #[serde(rename = "group-marker")]
    GroupMarker,
}

impl AnnotationKind {
    /// Fewest points for the kind to be meaningful; shorter submissions are
    /// discarded before storage.
    #[must_use]
    pub fn min_points(self) -> usize {
        match self {
            Self::GroupMarker => 0,
            Self::Point => 1,
            Self::Line | Self::Frame | Self::Area => 2,
            Self::Freehand => 2,
            Self::Hover => crate::consts::HOVER_MIN_POINTS + 1,
        }
    }

    /// Whether the kind carries polygon vertices (closable outline).
    #[must_use]
    pub fn is_region(self) -> bool {
        matches!(self, Self::Frame | Self::Area)
    }
}

/// One recorded spatial gesture.
///
/// Annotations are value records: after creation only `selected` and
/// `group_ids` change, and both changes go through [`SessionStore`]. Points
/// are in recording-canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub points: Vec<Point>,
    pub color: String,
    /// Creation time in monotonic milliseconds — the session ordering key.
    pub timestamp_ms: f64,
    /// Transient UI state; serialized but carries no session semantics.
    #[serde(default)]
    pub selected: bool,
    /// Group memberships in the order they were acquired. Append-only.
    #[serde(default)]
    pub group_ids: Vec<GroupId>,
    /// Classification label, populated for freehand/hover kinds at creation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gesture: Option<GestureKind>,
    /// Classification metrics, populated alongside `gesture`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metrics: Option<TraceMetrics>,
}

impl Annotation {
    /// Type-dependent perimeter: fixed nominal constant for zero-extent
    /// kinds, segment length for lines, closed-loop perimeter for regions
    /// with ≥3 vertices, open polyline length otherwise.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        match self.kind {
            AnnotationKind::Point | AnnotationKind::GroupMarker => POINT_PERIMETER,
            AnnotationKind::Line => {
                if self.points.len() < 2 {
                    0.0
                } else {
                    geom::distance(self.points[0], self.points[1])
                }
            }
            AnnotationKind::Frame | AnnotationKind::Area => geom::polygon_perimeter(&self.points),
            AnnotationKind::Freehand | AnnotationKind::Hover => geom::path_length(&self.points),
        }
    }

    /// Axis-aligned bounds of the annotation's points.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        geom::bounding_box(&self.points)
    }
}

/// A new annotation as submitted by the engine; the store assigns the id and
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub kind: AnnotationKind,
    pub points: Vec<Point>,
    pub color: String,
    pub gesture: Option<GestureKind>,
    pub metrics: Option<TraceMetrics>,
}

impl NewAnnotation {
    /// A plain (unclassified) annotation of `kind` through `points`.
    #[must_use]
    pub fn plain(kind: AnnotationKind, points: Vec<Point>, color: String) -> Self {
        Self { kind, points, color, gesture: None, metrics: None }
    }
}

/// Sparse update for an annotation's two mutable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

/// An association of two or more annotations, created from a multi-selection.
/// Membership is immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub member_ids: Vec<AnnotationId>,
    pub timestamp_ms: f64,
}

/// One entry of the derived session timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub timestamp_ms: f64,
    pub event: TraceEvent,
}

/// What a timeline entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    Annotation(AnnotationId),
    GroupCreated(GroupId),
}

/// In-memory store of a recording session.
///
/// Append-only except for undo and reset; all mutation goes through the
/// operations below so derived views stay consistent.
pub struct SessionStore {
    annotations: Vec<Annotation>,
    groups: Vec<Group>,
    /// Whether the session is currently capturing input.
    pub recording: bool,
    /// Seconds remaining before a started session goes live.
    pub countdown: u32,
}

impl SessionStore {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            annotations: Vec::new(),
            groups: Vec::new(),
            recording: false,
            countdown: COUNTDOWN_START,
        }
    }

    // --- Creation ---

    /// Validate and append an annotation, assigning its id and timestamp.
    ///
    /// Returns `None` (and stores nothing) when the point list is shorter
    /// than the kind's minimum — invalid gestures are filtered, not errors.
    pub fn add_annotation(&mut self, new: NewAnnotation, now_ms: f64) -> Option<AnnotationId> {
        if new.points.len() < new.kind.min_points() {
            return None;
        }
        let id = Uuid::new_v4();
        self.annotations.push(Annotation {
            id,
            kind: new.kind,
            points: new.points,
            color: new.color,
            timestamp_ms: now_ms,
            selected: false,
            group_ids: Vec::new(),
            gesture: new.gesture,
            metrics: new.metrics,
        });
        Some(id)
    }

    // --- Mutation ---

    /// Apply a sparse update. Returns false if the annotation doesn't exist.
    pub fn update_annotation(&mut self, id: &AnnotationId, patch: &AnnotationPatch) -> bool {
        let Some(slot) = self.annotations.iter_mut().find(|a| a.id == *id) else {
            return false;
        };
        let mut next = slot.clone();
        if let Some(ref color) = patch.color {
            next.color = color.clone();
        }
        if let Some(selected) = patch.selected {
            next.selected = selected;
        }
        *slot = next;
        true
    }

    /// Remove an annotation. Its id stays in any group that recorded it;
    /// only the live selection forgets it.
    pub fn delete_annotation(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let idx = self.annotations.iter().position(|a| a.id == *id)?;
        Some(self.annotations.remove(idx))
    }

    /// Toggle selection of one annotation.
    ///
    /// With `multi` the toggle leaves other selections alone; without it the
    /// clicked annotation becomes (or stops being) the sole selection.
    pub fn select_annotation(&mut self, id: &AnnotationId, multi: bool) -> bool {
        if !self.annotations.iter().any(|a| a.id == *id) {
            return false;
        }
        for a in &mut self.annotations {
            if a.id == *id {
                a.selected = !a.selected;
            } else if !multi {
                a.selected = false;
            }
        }
        true
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        for a in &mut self.annotations {
            a.selected = false;
        }
    }

    /// Ids of selected annotations in timestamp order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<AnnotationId> {
        let mut selected: Vec<&Annotation> =
            self.annotations.iter().filter(|a| a.selected).collect();
        selected.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        selected.iter().map(|a| a.id).collect()
    }

    // --- Grouping ---

    /// Create a group from `ids`, appending the group id to each member.
    ///
    /// Ids that don't resolve to live annotations are dropped; fewer than two
    /// surviving members makes this a no-op returning `None`.
    pub fn create_group(&mut self, ids: &[AnnotationId], now_ms: f64) -> Option<GroupId> {
        let mut member_ids: Vec<AnnotationId> = Vec::new();
        for id in ids {
            if self.annotations.iter().any(|a| a.id == *id) && !member_ids.contains(id) {
                member_ids.push(*id);
            }
        }
        if member_ids.len() < 2 {
            return None;
        }

        let group_id = Uuid::new_v4();
        for a in &mut self.annotations {
            if member_ids.contains(&a.id) {
                a.group_ids.push(group_id);
            }
        }
        self.groups.push(Group { id: group_id, member_ids, timestamp_ms: now_ms });
        Some(group_id)
    }

    // --- Undo / reset ---

    /// Remove the most recently created annotation (newest timestamp).
    pub fn undo(&mut self) -> Option<Annotation> {
        let idx = self
            .annotations
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.timestamp_ms.total_cmp(&b.timestamp_ms))
            .map(|(i, _)| i)?;
        Some(self.annotations.remove(idx))
    }

    /// Clear the whole session: annotations, groups, selection, recording
    /// flag, and countdown.
    pub fn reset(&mut self) {
        self.annotations.clear();
        self.groups.clear();
        self.recording = false;
        self.countdown = COUNTDOWN_START;
    }

    /// Advance the pre-recording countdown by one second; recording goes
    /// live when it reaches zero. Returns the remaining count.
    pub fn countdown_tick(&mut self) -> u32 {
        if self.countdown > 0 {
            self.countdown -= 1;
        }
        if self.countdown == 0 {
            self.recording = true;
        }
        self.countdown
    }

    // --- Queries ---

    /// All annotations in insertion order.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// All groups in creation order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up an annotation by id.
    #[must_use]
    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == *id)
    }

    /// Look up a group by id.
    #[must_use]
    pub fn get_group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == *id)
    }

    /// Number of annotations in the session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Returns `true` if the session has no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotations sorted by timestamp — the draw/replay order.
    #[must_use]
    pub fn sorted_annotations(&self) -> Vec<&Annotation> {
        let mut sorted: Vec<&Annotation> = self.annotations.iter().collect();
        sorted.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        sorted
    }

    /// The derived session timeline: every annotation plus one synthetic
    /// "group created" entry per group, sorted by timestamp ascending.
    #[must_use]
    pub fn traces(&self) -> Vec<TraceEntry> {
        let mut entries: Vec<TraceEntry> = self
            .annotations
            .iter()
            .map(|a| TraceEntry {
                timestamp_ms: a.timestamp_ms,
                event: TraceEvent::Annotation(a.id),
            })
            .collect();
        entries.extend(self.groups.iter().map(|g| TraceEntry {
            timestamp_ms: g.timestamp_ms,
            event: TraceEvent::GroupCreated(g.id),
        }));
        entries.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        entries
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
