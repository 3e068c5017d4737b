//! Gesture capture and annotation engine for the ArchEyes image-viewing study.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! full lifecycle of an annotation session over a static image: translating
//! raw DOM input events into typed annotations, classifying freehand and
//! hover traces into semantic gesture labels, hit-testing and rendering the
//! recorded scene, and replaying a session on an arbitrarily sized surface in
//! sync with an audio clock. The host JavaScript layer is responsible only
//! for wiring DOM events to the engine and shipping the resulting
//! [`engine::Action`]s (and the serialized [`export::SessionBundle`]) to the
//! backend.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`store`] | In-memory annotation/group store and session state |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`classify`] | Heuristic gesture classification of point traces |
//! | [`geom`] | Pure geometry: distances, bounds, hit primitives, scaling |
//! | [`hit`] | Hit-testing against committed annotations |
//! | [`render`] | Scene rendering to a 2D canvas context |
//! | [`replay`] | Coordinate remapping and progressive session replay |
//! | [`export`] | JSON session bundle for the persistence backend |
//! | [`consts`] | Shared numeric constants (timing, thresholds, palette) |

pub mod classify;
pub mod consts;
pub mod engine;
pub mod export;
pub mod geom;
pub mod hit;
pub mod input;
pub mod render;
pub mod replay;
pub mod store;

/// Install the browser logging backend and panic hook.
///
/// Called once by the host before constructing an [`engine::Engine`]. Safe to
/// call repeatedly; later calls keep the logger installed first.
pub fn init_host_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // A logger is already registered; keep it.
    }
}
