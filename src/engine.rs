//! Top-level engine: routes input intents through the classifier into the
//! store, and owns the browser canvas on the WASM side.
//!
//! [`EngineCore`] holds all logic that doesn't depend on the canvas element
//! so it can be tested without WASM/browser dependencies. [`Engine`] wraps it
//! together with the canvas and base image elements, converts client pixels,
//! and paints — a renderer fault is logged and the frame skipped, never
//! allowed into the input pipeline.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::classify;
use crate::consts::{DEFAULT_COLOR, HOVER_FADE_MS, HOVER_MIN_POINTS, MIN_DRAG_DISTANCE_PX};
use crate::geom::{self, ImageScaling, Point};
use crate::hit;
use crate::input::{InputMachine, Intent, Key, Modifiers, Tool};
use crate::render;
use crate::store::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, Group, NewAnnotation, SessionStore,
};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from event handlers for the host to process.
#[derive(Debug, Clone)]
pub enum Action {
    AnnotationCreated(Annotation),
    AnnotationUpdated { id: AnnotationId },
    AnnotationDeleted { id: AnnotationId },
    GroupCreated(Group),
    SelectionChanged,
    ToolChanged(Tool),
    RenderNeeded,
}

/// The recording surface captured alongside a session, so replay can remap
/// points onto a differently sized display.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordedSurface {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub scaling: ImageScaling,
}

/// Core engine state — all logic that doesn't depend on the canvas element.
pub struct EngineCore {
    pub store: SessionStore,
    pub input: InputMachine,
    color: String,
    image_size: Option<(f64, f64)>,
    max_canvas_height: Option<f64>,
    scaling: Option<ImageScaling>,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            store: SessionStore::new(),
            input: InputMachine::new(),
            color: DEFAULT_COLOR.to_owned(),
            image_size: None,
            max_canvas_height: None,
            scaling: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Surface configuration ---

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
        self.refit_image();
        vec![Action::RenderNeeded]
    }

    /// Record the base image's natural pixel dimensions.
    pub fn set_image_size(&mut self, natural_width: f64, natural_height: f64) -> Vec<Action> {
        self.image_size = Some((natural_width, natural_height));
        self.refit_image();
        vec![Action::RenderNeeded]
    }

    /// Cap the usable canvas height (e.g. a toolbar reserves the rest).
    pub fn set_max_canvas_height(&mut self, max_height: Option<f64>) -> Vec<Action> {
        self.max_canvas_height = max_height;
        self.refit_image();
        vec![Action::RenderNeeded]
    }

    fn refit_image(&mut self) {
        self.scaling = self.image_size.map(|(w, h)| {
            geom::fit_image(w, h, self.viewport_width, self.viewport_height, self.max_canvas_height)
        });
    }

    /// The current image placement, once viewport and image are known.
    #[must_use]
    pub fn scaling(&self) -> Option<ImageScaling> {
        self.scaling
    }

    /// The surface description to store with a finished session.
    #[must_use]
    pub fn recorded_surface(&self) -> Option<RecordedSurface> {
        self.scaling.map(|scaling| RecordedSurface {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            scaling,
        })
    }

    // --- Tool / color ---

    /// Switch the active tool, discarding any in-progress gesture.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let intents = self.input.set_tool(tool);
        self.apply_intents(intents, 0.0)
    }

    /// Set the color assigned to annotations from now on.
    pub fn set_color(&mut self, color: &str) -> Vec<Action> {
        self.color = color.to_owned();
        Vec::new()
    }

    /// The creation color currently in effect.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, at: Point, now_ms: f64) -> Vec<Action> {
        let intents = self.input.on_pointer_down(at, now_ms);
        self.apply_intents(intents, now_ms)
    }

    pub fn on_pointer_move(&mut self, at: Point, now_ms: f64) -> Vec<Action> {
        let intents = self.input.on_pointer_move(at, now_ms);
        let mut actions = self.apply_intents(intents, now_ms);
        // Any in-progress gesture wants a repaint on motion.
        if self.input.active_trace().is_some()
            || self.input.drag_preview().is_some()
            || self.input.hover_draft().is_some()
        {
            actions.push(Action::RenderNeeded);
        }
        coalesce_renders(actions)
    }

    pub fn on_pointer_up(&mut self, at: Point, modifiers: Modifiers, now_ms: f64) -> Vec<Action> {
        let intents = self.input.on_pointer_up(at, modifiers, now_ms);
        self.apply_intents(intents, now_ms)
    }

    pub fn on_pointer_leave(&mut self, now_ms: f64) -> Vec<Action> {
        let intents = self.input.on_pointer_leave(now_ms);
        self.apply_intents(intents, now_ms)
    }

    pub fn on_key_down(
        &mut self,
        key: &Key,
        modifiers: Modifiers,
        text_input_focused: bool,
        now_ms: f64,
    ) -> Vec<Action> {
        let intents = self.input.on_key_down(key, modifiers, text_input_focused, now_ms);
        self.apply_intents(intents, now_ms)
    }

    pub fn on_key_up(&mut self, key: &Key, now_ms: f64) -> Vec<Action> {
        let intents = self.input.on_key_up(key, now_ms);
        self.apply_intents(intents, now_ms)
    }

    /// Run deadlines that have come due (dwell, hover fade).
    pub fn poll(&mut self, now_ms: f64) -> Vec<Action> {
        let intents = self.input.poll(now_ms);
        self.apply_intents(intents, now_ms)
    }

    // --- Session operations ---

    /// Undo: drop the last polygon vertex if a shape is mid-construction
    /// with more than one vertex; otherwise remove the newest annotation.
    pub fn undo(&mut self) -> Vec<Action> {
        if self.input.pop_polygon_vertex() {
            return vec![Action::RenderNeeded];
        }
        match self.store.undo() {
            Some(removed) => {
                vec![Action::AnnotationDeleted { id: removed.id }, Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Group the current multi-selection. No-op below two selected.
    pub fn group_selected(&mut self, now_ms: f64) -> Vec<Action> {
        let ids = self.store.selected_ids();
        match self.store.create_group(&ids, now_ms) {
            Some(group_id) => match self.store.get_group(&group_id) {
                Some(group) => {
                    vec![Action::GroupCreated(group.clone()), Action::RenderNeeded]
                }
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    /// Apply a sparse annotation update (color, selection).
    pub fn update_annotation(&mut self, id: &AnnotationId, patch: &AnnotationPatch) -> Vec<Action> {
        if self.store.update_annotation(id, patch) {
            vec![Action::AnnotationUpdated { id: *id }, Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Delete one annotation.
    pub fn delete_annotation(&mut self, id: &AnnotationId) -> Vec<Action> {
        match self.store.delete_annotation(id) {
            Some(removed) => {
                vec![Action::AnnotationDeleted { id: removed.id }, Action::RenderNeeded]
            }
            None => Vec::new(),
        }
    }

    /// Clear the session: annotations, groups, selection, in-progress
    /// gestures, tool, color, countdown.
    pub fn reset_session(&mut self) -> Vec<Action> {
        let shortcuts = self.input.shortcuts().clone();
        self.input = InputMachine::new();
        *self.input.shortcuts_mut() = shortcuts;
        self.store.reset();
        self.color = DEFAULT_COLOR.to_owned();
        vec![Action::RenderNeeded]
    }

    // --- Rendering support ---

    /// Fade alpha of the hover trail at `now_ms`: 1.0 right after movement,
    /// 0.0 at the fade deadline.
    #[must_use]
    pub fn hover_alpha(&self, now_ms: f64) -> f64 {
        self.input
            .hover_draft()
            .map_or(0.0, |h| (1.0 - (now_ms - h.last_move_ms) / HOVER_FADE_MS).clamp(0.0, 1.0))
    }

    /// Snapshot of transient drawing state for the renderer.
    #[must_use]
    pub fn overlay(&self, now_ms: f64) -> render::Overlay<'_> {
        render::Overlay {
            active_trace: self.input.active_trace(),
            drag: self.input.drag_preview().map(|(from, to)| (self.input.tool(), from, to)),
            polygon: self.input.polygon_draft(),
            hover: self.input.hover_draft().map(|h| (h.trace.as_slice(), self.hover_alpha(now_ms))),
            color: &self.color,
        }
    }

    // --- Intent application ---

    fn apply_intents(&mut self, intents: Vec<Intent>, now_ms: f64) -> Vec<Action> {
        let mut actions = Vec::new();
        for intent in intents {
            self.apply_intent(intent, now_ms, &mut actions);
        }
        coalesce_renders(actions)
    }

    fn apply_intent(&mut self, intent: Intent, now_ms: f64, actions: &mut Vec<Action>) {
        match intent {
            Intent::Tap { at } | Intent::Dwell { at } => {
                let new =
                    NewAnnotation::plain(AnnotationKind::Point, vec![at], self.color.clone());
                self.commit(new, now_ms, actions);
            }
            Intent::FreehandDone { trace } => self.commit_freehand(trace, now_ms, actions),
            Intent::HoverDone { trace } => self.commit_hover(trace, now_ms, actions),
            Intent::LineDone { from, to } => {
                let new = NewAnnotation::plain(
                    AnnotationKind::Line,
                    vec![from, to],
                    self.color.clone(),
                );
                self.commit(new, now_ms, actions);
            }
            Intent::PolygonClosed { tool, vertices } => {
                let new =
                    NewAnnotation::plain(region_kind(tool), vertices, self.color.clone());
                self.commit(new, now_ms, actions);
            }
            Intent::RectDone { tool, from, to } => {
                let new = NewAnnotation::plain(
                    region_kind(tool),
                    vec![from, to],
                    self.color.clone(),
                );
                self.commit(new, now_ms, actions);
            }
            Intent::VertexPlaced { .. } | Intent::Cancelled => actions.push(Action::RenderNeeded),
            Intent::SelectAt { at, additive } => self.apply_select(at, additive, actions),
            Intent::SelectionCleared => {
                self.store.deselect_all();
                actions.push(Action::SelectionChanged);
                actions.push(Action::RenderNeeded);
            }
            Intent::GroupRequested => actions.extend(self.group_selected(now_ms)),
            Intent::UndoRequested => actions.extend(self.undo()),
            Intent::ToolChanged { tool } => {
                actions.push(Action::ToolChanged(tool));
                actions.push(Action::RenderNeeded);
            }
        }
    }

    fn commit(&mut self, new: NewAnnotation, now_ms: f64, actions: &mut Vec<Action>) {
        if let Some(id) = self.store.add_annotation(new, now_ms) {
            if let Some(annotation) = self.store.get(&id) {
                actions.push(Action::AnnotationCreated(annotation.clone()));
            }
        }
        // Either a new mark appeared or an in-progress one vanished.
        actions.push(Action::RenderNeeded);
    }

    fn commit_freehand(&mut self, trace: Vec<Point>, now_ms: f64, actions: &mut Vec<Action>) {
        // Sub-threshold drags are filtered, not errors.
        if geom::path_length(&trace) < MIN_DRAG_DISTANCE_PX {
            actions.push(Action::RenderNeeded);
            return;
        }
        let classified = classify::classify(&trace, false);
        let new = NewAnnotation {
            kind: AnnotationKind::Freehand,
            points: trace,
            color: self.color.clone(),
            gesture: Some(classified.kind),
            metrics: Some(classified.metrics),
        };
        self.commit(new, now_ms, actions);
    }

    fn commit_hover(&mut self, trace: Vec<Point>, now_ms: f64, actions: &mut Vec<Action>) {
        if trace.len() <= HOVER_MIN_POINTS {
            actions.push(Action::RenderNeeded);
            return;
        }
        let classified = classify::classify(&trace, true);
        let new = NewAnnotation {
            kind: AnnotationKind::Hover,
            points: trace,
            color: self.color.clone(),
            gesture: Some(classified.kind),
            metrics: Some(classified.metrics),
        };
        self.commit(new, now_ms, actions);
    }

    fn apply_select(&mut self, at: Point, additive: bool, actions: &mut Vec<Action>) {
        match hit::hit_test(at, self.store.annotations()) {
            Some(id) => {
                self.store.select_annotation(&id, additive);
                actions.push(Action::SelectionChanged);
            }
            None => {
                // Clicking empty space without shift clears the selection.
                if !additive && !self.store.selected_ids().is_empty() {
                    self.store.deselect_all();
                    actions.push(Action::SelectionChanged);
                }
            }
        }
        actions.push(Action::RenderNeeded);
    }
}

/// Map a region tool to its stored kind. Non-region tools fall back to
/// `Frame`; the machine never sends them here.
fn region_kind(tool: Tool) -> AnnotationKind {
    match tool {
        Tool::Area => AnnotationKind::Area,
        _ => AnnotationKind::Frame,
    }
}

/// Collapse repeated `RenderNeeded` actions into a single trailing one, so a
/// burst of intents triggers at most one repaint.
fn coalesce_renders(actions: Vec<Action>) -> Vec<Action> {
    let render_needed = actions.iter().any(|a| matches!(a, Action::RenderNeeded));
    let mut out: Vec<Action> = actions
        .into_iter()
        .filter(|a| !matches!(a, Action::RenderNeeded))
        .collect();
    if render_needed {
        out.push(Action::RenderNeeded);
    }
    out
}

/// The full canvas engine. Wraps [`EngineCore`] and owns the browser canvas
/// and base image elements.
pub struct Engine {
    canvas: HtmlCanvasElement,
    image: Option<HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, image: None, core: EngineCore::new() }
    }

    /// Attach the base image; its natural dimensions drive the scaling.
    pub fn set_image(&mut self, image: HtmlImageElement) -> Vec<Action> {
        let actions = self
            .core
            .set_image_size(f64::from(image.natural_width()), f64::from(image.natural_height()));
        self.image = Some(image);
        actions
    }

    /// Update viewport dimensions and device pixel ratio, resizing the
    /// canvas backing store to match.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.canvas.set_width((width_css * dpr).round().max(0.0) as u32);
            self.canvas.set_height((height_css * dpr).round().max(0.0) as u32);
        }
        self.core.set_viewport(width_css, height_css, dpr)
    }

    /// Convert an event position (CSS pixels relative to the canvas) into
    /// engine coordinates, accounting for CSS scaling of the element.
    #[must_use]
    pub fn pointer_point(&self, offset_x: f64, offset_y: f64) -> Point {
        geom::css_to_canvas(
            Point::new(offset_x, offset_y),
            f64::from(self.canvas.client_width()),
            f64::from(self.canvas.client_height()),
            self.core.viewport_width,
            self.core.viewport_height,
        )
    }

    // --- Delegated input events ---

    pub fn on_pointer_down(&mut self, offset_x: f64, offset_y: f64, now_ms: f64) -> Vec<Action> {
        let at = self.pointer_point(offset_x, offset_y);
        self.core.on_pointer_down(at, now_ms)
    }

    pub fn on_pointer_move(&mut self, offset_x: f64, offset_y: f64, now_ms: f64) -> Vec<Action> {
        let at = self.pointer_point(offset_x, offset_y);
        self.core.on_pointer_move(at, now_ms)
    }

    pub fn on_pointer_up(
        &mut self,
        offset_x: f64,
        offset_y: f64,
        modifiers: Modifiers,
        now_ms: f64,
    ) -> Vec<Action> {
        let at = self.pointer_point(offset_x, offset_y);
        self.core.on_pointer_up(at, modifiers, now_ms)
    }

    pub fn on_pointer_leave(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.on_pointer_leave(now_ms)
    }

    pub fn on_key_down(
        &mut self,
        key: &Key,
        modifiers: Modifiers,
        text_input_focused: bool,
        now_ms: f64,
    ) -> Vec<Action> {
        self.core.on_key_down(key, modifiers, text_input_focused, now_ms)
    }

    pub fn on_key_up(&mut self, key: &Key, now_ms: f64) -> Vec<Action> {
        self.core.on_key_up(key, now_ms)
    }

    pub fn poll(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.poll(now_ms)
    }

    // --- Render ---

    /// Draw the current state to the canvas. Faults are logged and the frame
    /// skipped; recorded annotations are never at risk from a paint error.
    pub fn render(&self, now_ms: f64) {
        let Some(ctx) = self.context_2d() else {
            log::warn!("canvas 2d context unavailable; skipping frame");
            return;
        };
        let Some(scaling) = self.core.scaling() else {
            // Image dimensions not known yet; nothing to draw over.
            return;
        };
        let overlay = self.core.overlay(now_ms);
        let viewport = render::Viewport {
            width: self.core.viewport_width,
            height: self.core.viewport_height,
            dpr: self.core.dpr,
        };
        if let Err(err) =
            render::draw(&ctx, self.image.as_ref(), &self.core.store, &overlay, &scaling, viewport)
        {
            log::warn!("render failed, frame skipped: {err:?}");
        }
    }

    fn context_2d(&self) -> Option<CanvasRenderingContext2d> {
        match self.canvas.get_context("2d") {
            Ok(Some(obj)) => match obj.dyn_into::<CanvasRenderingContext2d>() {
                Ok(ctx) => Some(ctx),
                Err(_) => None,
            },
            _ => None,
        }
    }
}
