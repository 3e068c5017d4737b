//! Input model: tools, modifier keys, deadlines, and the gesture state
//! machine.
//!
//! [`InputMachine`] consumes low-level pointer/keyboard events (each stamped
//! with the host's monotonic clock) and emits high-level [`Intent`]s for the
//! engine to apply. It owns every in-progress gesture — the undecided press,
//! the freehand trace, the polygon under construction, the hover trail — and
//! the two named deadlines (dwell, hover fade) that turn time into intents.
//!
//! The machine never touches the annotation store: intents that need
//! store/hit-test context (`SelectAt`, `GroupRequested`, `UndoRequested`)
//! are resolved by [`crate::engine::EngineCore`].
//!
//! Deadlines are polled, not self-firing: the host arms a real timer for
//! [`InputMachine::next_deadline`] and calls [`InputMachine::poll`] when it
//! fires. Every handler runs due deadlines before applying its event, so a
//! release at exactly the dwell threshold counts as a dwell. Stale timer
//! callbacks are phase-guarded no-ops.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::collections::HashMap;

use crate::consts::{
    DWELL_MS, HOVER_FADE_MS, MIN_DRAG_DISTANCE_PX, MOVE_THRESHOLD_PX, POLYGON_CLOSE_RADIUS_PX,
};
use crate::geom::{self, Point};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Tap or dwell a single location (default).
    #[default]
    Point,
    /// Draw a classified freehand stroke.
    Freehand,
    /// Place a two-point straight segment.
    Line,
    /// Outline a region (polygon or legacy drag-rectangle).
    Frame,
    /// Mark a filled region (same input as `Frame`).
    Area,
    /// Pointer / selection tool.
    Select,
}

impl Tool {
    /// Whether this tool records marks (everything but `Select`).
    #[must_use]
    pub fn is_drawing(self) -> bool {
        !matches!(self, Self::Select)
    }

    /// Whether this tool places vertices click by click.
    #[must_use]
    pub fn is_vertex_based(self) -> bool {
        matches!(self, Self::Line | Self::Frame | Self::Area)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

/// A keyboard key; the inner string holds the key name as reported by the
/// browser (e.g. `"Escape"`, `"Shift"`, `"p"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Single-letter tool shortcuts, remappable by the host.
#[derive(Debug, Clone)]
pub struct ShortcutMap {
    bindings: HashMap<String, Tool>,
}

impl Default for ShortcutMap {
    fn default() -> Self {
        let mut map = Self { bindings: HashMap::new() };
        map.bind("p", Tool::Point);
        map.bind("d", Tool::Freehand);
        map.bind("l", Tool::Line);
        map.bind("f", Tool::Frame);
        map.bind("a", Tool::Area);
        map.bind("s", Tool::Select);
        map
    }
}

impl ShortcutMap {
    /// Bind (or rebind) a key to a tool. Keys are case-insensitive.
    pub fn bind(&mut self, key: impl Into<String>, tool: Tool) {
        self.bindings.insert(key.into().to_ascii_lowercase(), tool);
    }

    /// Resolve a key name to a tool, if bound.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Tool> {
        self.bindings.get(&key.to_ascii_lowercase()).copied()
    }
}

/// A named cancellable deadline owned by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineKind {
    /// The press is about to become a dwell.
    Dwell,
    /// The hover trail is about to fade out and finalize.
    HoverFade,
}

/// High-level intent emitted by the machine for the engine to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Quick press-release: commit one point annotation at the release.
    Tap { at: Point },
    /// Press held past the dwell threshold: commit one point annotation.
    Dwell { at: Point },
    /// A freehand stroke finished; classify and commit it.
    FreehandDone { trace: Vec<Point> },
    /// A hover trail finalized; classify and commit it if long enough.
    HoverDone { trace: Vec<Point> },
    /// A vertex was added to the in-progress shape (render refresh).
    VertexPlaced { tool: Tool, at: Point },
    /// A closing click landed on the first vertex; commit the polygon.
    PolygonClosed { tool: Tool, vertices: Vec<Point> },
    /// A line gained its second endpoint; commit it.
    LineDone { from: Point, to: Point },
    /// A legacy drag-rectangle finished; commit it.
    RectDone { tool: Tool, from: Point, to: Point },
    /// An in-progress gesture was discarded with no side effect.
    Cancelled,
    /// A selection click; the engine hit-tests and toggles.
    SelectAt { at: Point, additive: bool },
    /// Selection should be cleared (shift released).
    SelectionCleared,
    /// Group the current multi-selection.
    GroupRequested,
    /// Undo the last vertex or annotation.
    UndoRequested,
    /// The active tool changed.
    ToolChanged { tool: Tool },
}

/// The pointer-capture phase between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// No press in progress; waiting for the next pointer-down.
    Idle,
    /// Pointer down, undecided: could become tap, dwell, drag, or click.
    Pending {
        /// Where the press started.
        start: Point,
        /// When the press started.
        down_at: f64,
        /// The pointer travelled past the move threshold.
        moved: bool,
    },
    /// Accumulating a freehand trace on every move.
    Drawing {
        /// Points collected so far, starting at the press location.
        trace: Vec<Point>,
    },
    /// Sizing a line or legacy rectangle by dragging.
    Dragging {
        /// The anchor corner / endpoint.
        start: Point,
        /// The pointer's latest position.
        current: Point,
    },
    /// The dwell already committed; the release is a no-op.
    DwellFired,
}

/// A polygon (or line) under click-by-click construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonDraft {
    /// The tool that started the shape.
    pub tool: Tool,
    /// Vertices placed so far; the first one is the closing target.
    pub vertices: Vec<Point>,
}

/// A hover trail accumulating while the pointer is up.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverDraft {
    /// Move positions collected so far.
    pub trace: Vec<Point>,
    /// When the pointer last moved; drives the fade deadline.
    pub last_move_ms: f64,
}

/// The gesture state machine.
pub struct InputMachine {
    tool: Tool,
    /// Tool to restore when the temporary shift-select mode ends.
    previous_tool: Option<Tool>,
    shift_select: bool,
    phase: Phase,
    polygon: Option<PolygonDraft>,
    hover: Option<HoverDraft>,
    dwell_deadline: Option<f64>,
    shortcuts: ShortcutMap,
}

impl Default for InputMachine {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            previous_tool: None,
            shift_select: false,
            phase: Phase::Idle,
            polygon: None,
            hover: None,
            dwell_deadline: None,
            shortcuts: ShortcutMap::default(),
        }
    }
}

impl InputMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    /// The currently active tool.
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Whether shift is holding the machine in temporary select mode.
    #[must_use]
    pub fn is_shift_select(&self) -> bool {
        self.shift_select
    }

    /// The current pointer-capture phase.
    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The freehand trace being drawn, if any.
    #[must_use]
    pub fn active_trace(&self) -> Option<&[Point]> {
        if let Phase::Drawing { trace } = &self.phase {
            Some(trace)
        } else {
            None
        }
    }

    /// The drag anchor and latest pointer position, if dragging.
    #[must_use]
    pub fn drag_preview(&self) -> Option<(Point, Point)> {
        if let Phase::Dragging { start, current } = self.phase {
            Some((start, current))
        } else {
            None
        }
    }

    /// The polygon under construction, if any.
    #[must_use]
    pub fn polygon_draft(&self) -> Option<&PolygonDraft> {
        self.polygon.as_ref()
    }

    /// The hover trail being tracked, if any.
    #[must_use]
    pub fn hover_draft(&self) -> Option<&HoverDraft> {
        self.hover.as_ref()
    }

    /// The current shortcut bindings.
    #[must_use]
    pub fn shortcuts(&self) -> &ShortcutMap {
        &self.shortcuts
    }

    /// Remap a tool shortcut.
    pub fn shortcuts_mut(&mut self) -> &mut ShortcutMap {
        &mut self.shortcuts
    }

    /// The earliest pending deadline, for the host to arm a timer against.
    #[must_use]
    pub fn next_deadline(&self) -> Option<(DeadlineKind, f64)> {
        let dwell = self.dwell_deadline.map(|at| (DeadlineKind::Dwell, at));
        let fade = self
            .hover
            .as_ref()
            .map(|h| (DeadlineKind::HoverFade, h.last_move_ms + HOVER_FADE_MS));
        match (dwell, fade) {
            (Some(d), Some(f)) => Some(if d.1 <= f.1 { d } else { f }),
            (d, f) => d.or(f),
        }
    }

    // --- Tool management ---

    /// Switch tools, discarding any in-progress gesture.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Intent> {
        self.shift_select = false;
        self.previous_tool = None;
        self.change_tool(tool)
    }

    fn change_tool(&mut self, tool: Tool) -> Vec<Intent> {
        if tool == self.tool {
            return Vec::new();
        }
        let mut intents = self.discard_gesture_state();
        self.tool = tool;
        intents.push(Intent::ToolChanged { tool });
        intents
    }

    /// Drop every in-progress gesture, including the hover trail.
    fn discard_gesture_state(&mut self) -> Vec<Intent> {
        let had_progress = !matches!(self.phase, Phase::Idle) || self.polygon.is_some();
        self.dwell_deadline = None;
        self.phase = Phase::Idle;
        self.polygon = None;
        self.hover = None;
        if had_progress { vec![Intent::Cancelled] } else { Vec::new() }
    }

    /// Escape: drop the in-progress polygon/stroke/drag. The hover trail is
    /// untouched — it finalizes through its own deadline.
    fn cancel_in_progress(&mut self) -> Vec<Intent> {
        let had_progress = !matches!(self.phase, Phase::Idle) || self.polygon.is_some();
        self.dwell_deadline = None;
        self.phase = Phase::Idle;
        self.polygon = None;
        if had_progress { vec![Intent::Cancelled] } else { Vec::new() }
    }

    /// Remove the last placed vertex of the in-progress polygon.
    ///
    /// Returns false when no polygon is in progress or only one vertex is
    /// placed — the caller falls back to removing the newest annotation.
    pub fn pop_polygon_vertex(&mut self) -> bool {
        let Some(draft) = self.polygon.as_mut() else {
            return false;
        };
        if draft.vertices.len() > 1 {
            let keep = draft.vertices.len() - 1;
            draft.vertices.truncate(keep);
            true
        } else {
            false
        }
    }

    // --- Deadlines ---

    /// Run any deadline that has come due. Called by the host when an armed
    /// timer fires; also runs at the head of every event handler so event
    /// ordering matches wall-clock ordering.
    pub fn poll(&mut self, now_ms: f64) -> Vec<Intent> {
        self.run_due(now_ms)
    }

    fn run_due(&mut self, now_ms: f64) -> Vec<Intent> {
        let mut intents = Vec::new();

        if self.dwell_deadline.is_some_and(|due| due <= now_ms) {
            self.dwell_deadline = None;
            // Phase guard: a deadline that outlived its press is stale.
            let pending_start = if let Phase::Pending { start, .. } = &self.phase {
                Some(*start)
            } else {
                None
            };
            if let Some(start) = pending_start {
                self.phase = Phase::DwellFired;
                intents.push(Intent::Dwell { at: start });
            }
        }

        let faded = self
            .hover
            .as_ref()
            .is_some_and(|h| h.last_move_ms + HOVER_FADE_MS <= now_ms);
        if faded {
            if let Some(draft) = self.hover.take() {
                intents.push(Intent::HoverDone { trace: draft.trace });
            }
        }

        intents
    }

    // --- Pointer events ---

    pub fn on_pointer_down(&mut self, at: Point, now_ms: f64) -> Vec<Intent> {
        let mut intents = self.run_due(now_ms);

        // A press ends the hover trail: the user moved from attending to
        // acting.
        if let Some(draft) = self.hover.take() {
            intents.push(Intent::HoverDone { trace: draft.trace });
        }

        self.phase = Phase::Pending { start: at, down_at: now_ms, moved: false };
        if !self.shift_select && matches!(self.tool, Tool::Point | Tool::Freehand) {
            self.dwell_deadline = Some(now_ms + DWELL_MS);
        }
        intents
    }

    pub fn on_pointer_move(&mut self, at: Point, now_ms: f64) -> Vec<Intent> {
        let intents = self.run_due(now_ms);

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => {
                self.track_hover(at, now_ms);
                Phase::Idle
            }
            Phase::Pending { start, down_at, moved } => {
                if geom::distance(start, at) > MOVE_THRESHOLD_PX {
                    self.press_became_motion(start, down_at, at)
                } else {
                    Phase::Pending { start, down_at, moved }
                }
            }
            Phase::Drawing { mut trace } => {
                trace.push(at);
                Phase::Drawing { trace }
            }
            Phase::Dragging { start, .. } => Phase::Dragging { start, current: at },
            Phase::DwellFired => Phase::DwellFired,
        };
        intents
    }

    /// A pending press moved past the threshold; decide what it becomes.
    fn press_became_motion(&mut self, start: Point, down_at: f64, at: Point) -> Phase {
        if self.shift_select || self.tool == Tool::Select {
            return Phase::Pending { start, down_at, moved: true };
        }
        match self.tool {
            Tool::Freehand => {
                self.dwell_deadline = None;
                Phase::Drawing { trace: vec![start, at] }
            }
            Tool::Line | Tool::Frame | Tool::Area if self.polygon.is_none() => {
                Phase::Dragging { start, current: at }
            }
            _ => {
                // Point tool (movement defeats the dwell), or a vertex tool
                // with a shape already started (the release places/ends it).
                self.dwell_deadline = None;
                Phase::Pending { start, down_at, moved: true }
            }
        }
    }

    pub fn on_pointer_up(&mut self, at: Point, modifiers: Modifiers, now_ms: f64) -> Vec<Intent> {
        // Deadlines first: a release at exactly the dwell threshold is a
        // dwell, not a tap.
        let mut intents = self.run_due(now_ms);
        self.dwell_deadline = None;

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Idle | Phase::DwellFired => {}
            Phase::Pending { moved, .. } => {
                if self.shift_select || self.tool == Tool::Select {
                    if !moved {
                        intents.push(Intent::SelectAt { at, additive: modifiers.shift });
                    }
                } else {
                    match self.tool {
                        Tool::Point | Tool::Freehand => intents.push(Intent::Tap { at }),
                        Tool::Line => intents.extend(self.place_line_vertex(at)),
                        Tool::Frame | Tool::Area => intents.extend(self.place_region_vertex(at)),
                        Tool::Select => {}
                    }
                }
            }
            Phase::Drawing { mut trace } => {
                if trace.last() != Some(&at) {
                    trace.push(at);
                }
                intents.push(Intent::FreehandDone { trace });
            }
            Phase::Dragging { start, .. } => {
                if geom::distance(start, at) >= MIN_DRAG_DISTANCE_PX {
                    match self.tool {
                        Tool::Line => intents.push(Intent::LineDone { from: start, to: at }),
                        Tool::Frame | Tool::Area => {
                            intents.push(Intent::RectDone { tool: self.tool, from: start, to: at });
                        }
                        _ => {}
                    }
                } else {
                    intents.push(Intent::Cancelled);
                }
            }
        }
        intents
    }

    /// The pointer left the surface: the freehand trace commits, the hover
    /// trail finalizes, everything else is discarded.
    pub fn on_pointer_leave(&mut self, now_ms: f64) -> Vec<Intent> {
        let mut intents = self.run_due(now_ms);
        self.dwell_deadline = None;

        if let Some(draft) = self.hover.take() {
            intents.push(Intent::HoverDone { trace: draft.trace });
        }

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Idle | Phase::DwellFired | Phase::Pending { .. } => {}
            Phase::Drawing { trace } => intents.push(Intent::FreehandDone { trace }),
            Phase::Dragging { .. } => intents.push(Intent::Cancelled),
        }
        intents
    }

    // --- Keyboard events ---

    /// Handle a key press. `text_input_focused` suppresses every shortcut
    /// while an input/textarea element owns the keyboard.
    pub fn on_key_down(
        &mut self,
        key: &Key,
        modifiers: Modifiers,
        text_input_focused: bool,
        now_ms: f64,
    ) -> Vec<Intent> {
        let mut intents = self.run_due(now_ms);
        if text_input_focused {
            return intents;
        }

        match key.0.as_str() {
            "Shift" => {
                if !self.shift_select {
                    self.shift_select = true;
                    self.previous_tool = Some(self.tool);
                    intents.extend(self.change_tool(Tool::Select));
                }
            }
            "Escape" => intents.extend(self.cancel_in_progress()),
            " " | "Space" | "Spacebar" => {
                if modifiers.shift {
                    intents.push(Intent::GroupRequested);
                }
            }
            name => {
                if (modifiers.ctrl || modifiers.meta) && name.eq_ignore_ascii_case("z") {
                    intents.push(Intent::UndoRequested);
                } else if !modifiers.ctrl && !modifiers.meta && !modifiers.alt {
                    if let Some(tool) = self.shortcuts.lookup(name) {
                        intents.extend(self.set_tool(tool));
                    }
                }
            }
        }
        intents
    }

    pub fn on_key_up(&mut self, key: &Key, now_ms: f64) -> Vec<Intent> {
        let mut intents = self.run_due(now_ms);
        if key.0 == "Shift" && self.shift_select {
            self.shift_select = false;
            let restored = self.previous_tool.take().unwrap_or_default();
            intents.extend(self.change_tool(restored));
            intents.push(Intent::SelectionCleared);
        }
        intents
    }

    // --- Vertex placement ---

    fn place_line_vertex(&mut self, at: Point) -> Vec<Intent> {
        match self.polygon.take() {
            None => {
                self.polygon = Some(PolygonDraft { tool: Tool::Line, vertices: vec![at] });
                vec![Intent::VertexPlaced { tool: Tool::Line, at }]
            }
            Some(draft) => {
                let from = draft.vertices[0];
                if geom::distance(from, at) < MIN_DRAG_DISTANCE_PX {
                    // Too close to anchor a line; keep waiting for a real
                    // second endpoint.
                    self.polygon = Some(draft);
                    Vec::new()
                } else {
                    vec![Intent::LineDone { from, to: at }]
                }
            }
        }
    }

    fn place_region_vertex(&mut self, at: Point) -> Vec<Intent> {
        let tool = self.tool;
        match self.polygon.take() {
            None => {
                self.polygon = Some(PolygonDraft { tool, vertices: vec![at] });
                vec![Intent::VertexPlaced { tool, at }]
            }
            Some(mut draft) => {
                let closes = draft.vertices.len() >= 3
                    && geom::point_in_circle(at, draft.vertices[0], POLYGON_CLOSE_RADIUS_PX);
                if closes {
                    vec![Intent::PolygonClosed { tool, vertices: draft.vertices }]
                } else {
                    draft.vertices.push(at);
                    self.polygon = Some(draft);
                    vec![Intent::VertexPlaced { tool, at }]
                }
            }
        }
    }

    // --- Hover ---

    fn track_hover(&mut self, at: Point, now_ms: f64) {
        if self.tool == Tool::Select || self.shift_select || self.polygon.is_some() {
            return;
        }
        let draft = self
            .hover
            .get_or_insert_with(|| HoverDraft { trace: Vec::new(), last_move_ms: now_ms });
        draft.trace.push(at);
        draft.last_move_ms = now_ms;
    }
}
