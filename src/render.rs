//! Rendering: draws the annotation scene to a 2D canvas context.
//!
//! This module is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`]. It receives read-only views of the
//! store and the transient drawing state and produces pixels — it never
//! mutates application state, so a paint fault cannot corrupt the session.
//!
//! Layer order: base image → committed annotations (selection highlighted) →
//! in-progress freehand trace → fading hover trail → drag preview →
//! in-progress polygon (dashed, first vertex distinguished as the closing
//! target).
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`;
//! the top-level caller ([`crate::engine::Engine::render`]) logs and skips
//! the frame.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::{POINT_RADIUS_PX, SELECTION_COLOR};
use crate::geom::{ImageScaling, Point};
use crate::input::{PolygonDraft, Tool};
use crate::store::{Annotation, AnnotationKind, SessionStore};

/// Committed-annotation stroke width in pixels.
const STROKE_WIDTH: f64 = 2.0;

/// Hover trails draw thinner than deliberate strokes.
const HOVER_STROKE_WIDTH: f64 = 1.5;

/// Fill opacity for area annotations.
const AREA_FILL_ALPHA: f64 = 0.25;

/// Selection dash segment length in pixels.
const SELECTION_DASH_PX: f64 = 4.0;

/// Padding between an annotation's bounds and its selection box.
const SELECTION_PAD_PX: f64 = 4.0;

/// Radius of an in-progress polygon vertex marker.
const VERTEX_RADIUS_PX: f64 = 3.0;

/// Radius of the first vertex marker — the polygon-closing target.
const FIRST_VERTEX_RADIUS_PX: f64 = 5.0;

/// Viewport geometry for one frame. Dimensions are CSS pixels; `dpr` is the
/// device pixel ratio.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

/// Transient drawing state painted above the committed annotations.
pub struct Overlay<'a> {
    /// Freehand trace being drawn, if any.
    pub active_trace: Option<&'a [Point]>,
    /// Drag-rectangle/line preview: tool, anchor, pointer.
    pub drag: Option<(Tool, Point, Point)>,
    /// Polygon under construction.
    pub polygon: Option<&'a PolygonDraft>,
    /// Hover trail and its fade alpha.
    pub hover: Option<(&'a [Point], f64)>,
    /// Color for in-progress marks.
    pub color: &'a str,
}

/// Draw the full scene.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    image: Option<&HtmlImageElement>,
    store: &SessionStore,
    overlay: &Overlay<'_>,
    scaling: &ImageScaling,
    viewport: Viewport,
) -> Result<(), JsValue> {
    // Layer 1: clear in device pixels, then draw in CSS pixels.
    ctx.set_transform(viewport.dpr, 0.0, 0.0, viewport.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);

    // Layer 2: the base image, letterboxed.
    if let Some(img) = image {
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            img,
            scaling.offset_x,
            scaling.offset_y,
            scaling.display_width,
            scaling.display_height,
        )?;
    }

    // Layer 3: committed annotations in timestamp order.
    for annotation in store.sorted_annotations() {
        draw_annotation(ctx, annotation)?;
        if annotation.selected {
            draw_selection(ctx, annotation)?;
        }
    }

    // Layer 4: the in-progress freehand trace.
    if let Some(trace) = overlay.active_trace {
        ctx.set_stroke_style_str(overlay.color);
        ctx.set_line_width(STROKE_WIDTH);
        stroke_polyline(ctx, trace);
    }

    // Layer 5: the hover trail, alpha-faded toward its deadline.
    if let Some((trace, alpha)) = overlay.hover {
        ctx.save();
        ctx.set_global_alpha(alpha);
        ctx.set_stroke_style_str(overlay.color);
        ctx.set_line_width(HOVER_STROKE_WIDTH);
        stroke_polyline(ctx, trace);
        ctx.restore();
    }

    // Layer 6: drag preview (line endpoint or legacy rectangle).
    if let Some((tool, from, to)) = overlay.drag {
        draw_drag_preview(ctx, tool, from, to, overlay.color)?;
    }

    // Layer 7: the polygon under construction.
    if let Some(draft) = overlay.polygon {
        draw_polygon_draft(ctx, draft, overlay.color)?;
    }

    Ok(())
}

// =============================================================
// Committed annotations
// =============================================================

fn draw_annotation(ctx: &CanvasRenderingContext2d, annotation: &Annotation) -> Result<(), JsValue> {
    let points = &annotation.points;
    match annotation.kind {
        AnnotationKind::GroupMarker => Ok(()),
        AnnotationKind::Point => draw_point(ctx, annotation),
        AnnotationKind::Line => {
            if points.len() >= 2 {
                apply_stroke(ctx, &annotation.color, STROKE_WIDTH);
                ctx.begin_path();
                ctx.move_to(points[0].x, points[0].y);
                ctx.line_to(points[1].x, points[1].y);
                ctx.stroke();
            }
            Ok(())
        }
        AnnotationKind::Frame => draw_region(ctx, annotation, false),
        AnnotationKind::Area => draw_region(ctx, annotation, true),
        AnnotationKind::Freehand => {
            apply_stroke(ctx, &annotation.color, STROKE_WIDTH);
            stroke_polyline(ctx, points);
            Ok(())
        }
        AnnotationKind::Hover => {
            ctx.save();
            ctx.set_global_alpha(0.5);
            apply_stroke(ctx, &annotation.color, HOVER_STROKE_WIDTH);
            stroke_polyline(ctx, points);
            ctx.restore();
            Ok(())
        }
    }
}

fn draw_point(ctx: &CanvasRenderingContext2d, annotation: &Annotation) -> Result<(), JsValue> {
    let Some(&center) = annotation.points.first() else {
        return Ok(());
    };
    ctx.set_fill_style_str(&annotation.color);
    ctx.begin_path();
    ctx.arc(center.x, center.y, POINT_RADIUS_PX, 0.0, 2.0 * std::f64::consts::PI)?;
    ctx.fill();
    Ok(())
}

fn draw_region(
    ctx: &CanvasRenderingContext2d,
    annotation: &Annotation,
    filled: bool,
) -> Result<(), JsValue> {
    let points = &annotation.points;
    if points.len() >= 3 {
        ctx.begin_path();
        ctx.move_to(points[0].x, points[0].y);
        for p in &points[1..] {
            ctx.line_to(p.x, p.y);
        }
        ctx.close_path();
        if filled {
            fill_translucent(ctx, &annotation.color);
        }
        apply_stroke(ctx, &annotation.color, STROKE_WIDTH);
        ctx.stroke();
    } else if points.len() == 2 {
        // Legacy rectangle: two opposite corners.
        let (x, y, w, h) = rect_from_corners(points[0], points[1]);
        if filled {
            ctx.save();
            ctx.set_global_alpha(AREA_FILL_ALPHA);
            ctx.set_fill_style_str(&annotation.color);
            ctx.fill_rect(x, y, w, h);
            ctx.restore();
        }
        apply_stroke(ctx, &annotation.color, STROKE_WIDTH);
        ctx.stroke_rect(x, y, w, h);
    }
    Ok(())
}

fn draw_selection(ctx: &CanvasRenderingContext2d, annotation: &Annotation) -> Result<(), JsValue> {
    let Some(bounds) = annotation.bounds() else {
        return Ok(());
    };
    let pad = match annotation.kind {
        AnnotationKind::Point => POINT_RADIUS_PX + SELECTION_PAD_PX,
        _ => SELECTION_PAD_PX,
    };
    let b = bounds.inflated(pad);

    ctx.save();
    set_dash(ctx, SELECTION_DASH_PX)?;
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(b.min_x, b.min_y, b.width(), b.height());
    ctx.restore();
    Ok(())
}

// =============================================================
// In-progress overlays
// =============================================================

fn draw_drag_preview(
    ctx: &CanvasRenderingContext2d,
    tool: Tool,
    from: Point,
    to: Point,
    color: &str,
) -> Result<(), JsValue> {
    ctx.save();
    set_dash(ctx, SELECTION_DASH_PX)?;
    apply_stroke(ctx, color, 1.0);
    if tool == Tool::Line {
        ctx.begin_path();
        ctx.move_to(from.x, from.y);
        ctx.line_to(to.x, to.y);
        ctx.stroke();
    } else {
        let (x, y, w, h) = rect_from_corners(from, to);
        ctx.stroke_rect(x, y, w, h);
    }
    ctx.restore();
    Ok(())
}

fn draw_polygon_draft(
    ctx: &CanvasRenderingContext2d,
    draft: &PolygonDraft,
    color: &str,
) -> Result<(), JsValue> {
    let vertices = &draft.vertices;
    if vertices.is_empty() {
        return Ok(());
    }

    // Dashed preview of the placed edges.
    if vertices.len() >= 2 {
        ctx.save();
        set_dash(ctx, SELECTION_DASH_PX)?;
        apply_stroke(ctx, color, 1.0);
        stroke_polyline(ctx, vertices);
        ctx.restore();
    }

    // Vertex markers; the first is larger and hollow — the closing target.
    ctx.set_fill_style_str(color);
    for v in &vertices[1..] {
        ctx.begin_path();
        ctx.arc(v.x, v.y, VERTEX_RADIUS_PX, 0.0, 2.0 * std::f64::consts::PI)?;
        ctx.fill();
    }
    let first = vertices[0];
    ctx.begin_path();
    ctx.arc(first.x, first.y, FIRST_VERTEX_RADIUS_PX, 0.0, 2.0 * std::f64::consts::PI)?;
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(STROKE_WIDTH);
    ctx.stroke();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

fn apply_stroke(ctx: &CanvasRenderingContext2d, color: &str, width: f64) {
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
}

fn stroke_polyline(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    if points.len() < 2 {
        return;
    }
    ctx.begin_path();
    ctx.move_to(points[0].x, points[0].y);
    for p in &points[1..] {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();
}

fn fill_translucent(ctx: &CanvasRenderingContext2d, color: &str) {
    ctx.save();
    ctx.set_global_alpha(AREA_FILL_ALPHA);
    ctx.set_fill_style_str(color);
    ctx.fill();
    ctx.restore();
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash_px: f64) -> Result<(), JsValue> {
    let dashes = js_sys::Array::new();
    dashes.push(&dash_px.into());
    dashes.push(&dash_px.into());
    ctx.set_line_dash(&dashes)
}

/// Normalize two opposite corners into `(x, y, w, h)` with positive extent.
pub(crate) fn rect_from_corners(a: Point, b: Point) -> (f64, f64, f64, f64) {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    (x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
}

/// Dispatch a hit test by annotation kind, in display coordinates.
#[must_use]
pub fn is_point_in_annotation(annotation: &Annotation, at: Point) -> bool {
    crate::hit::annotation_contains(annotation, at)
}
