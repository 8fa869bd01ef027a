//! Canvas capability: the scene model exchanged with a drawing surface, the
//! [`Canvas`] trait consumed by versioning, and [`Board`], an in-memory canvas.
//!
//! # Invariants
//! - Scene contents are opaque here; nothing validates element or app-state shape.
//! - A replacement applied with [`CaptureUpdate::Never`] leaves undo history untouched.

mod board;
mod scene;

pub use board::{Board, BoardEvent, Canvas, CanvasError};
pub use scene::{BinaryFile, CaptureUpdate, Scene, SceneUpdate, ViewState};

pub fn crate_info() -> &'static str {
    "boardspace-canvas v0.1.0"
}
