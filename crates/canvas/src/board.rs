use crate::scene::{BinaryFile, CaptureUpdate, Scene, SceneUpdate};
use serde_json::Value;
use std::path::Path;

/// Errors raised by a canvas.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("scene export failed: {0}")]
    ExportFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A drawing surface whose scene can be exported and replaced.
pub trait Canvas: Send {
    /// Read the current elements, view-state, and attachments.
    fn export_scene(&self) -> Result<Scene, CanvasError>;

    /// Replace elements and view-state. `capture` decides whether the
    /// replacement becomes an undoable step.
    fn replace_scene(&mut self, update: SceneUpdate, capture: CaptureUpdate);

    /// Add binary files to the canvas, overwriting any with the same id.
    fn register_attachments(&mut self, files: Vec<BinaryFile>);
}

/// A record of every call that changed the board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// Scene was replaced. `recorded` is true when it went onto undo history.
    SceneReplaced { elements: usize, recorded: bool },
    /// Binary files were registered.
    AttachmentsRegistered { ids: Vec<String> },
}

/// In-memory canvas with an undo history of prior scenes.
///
/// Every authoring call pushes the previous scene so `undo()` can return to
/// it; replacements applied with [`CaptureUpdate::Never`] do not.
#[derive(Debug, Clone, Default)]
pub struct Board {
    scene: Scene,
    history: Vec<Scene>,
    events: Vec<BoardEvent>,
    fail_exports: bool,
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board showing the given scene, with empty history.
    pub fn from_scene(scene: Scene) -> Self {
        Self {
            scene,
            ..Default::default()
        }
    }

    /// Load a board from a scene JSON file. A missing file yields an empty board.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CanvasError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "board file missing, starting empty");
            return Ok(Self::new());
        }
        let scene: Scene = serde_json::from_reader(std::fs::File::open(path)?)?;
        Ok(Self::from_scene(scene))
    }

    /// Write the current scene to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CanvasError> {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.scene)?;
        Ok(())
    }

    /// Read-only access to the current scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn elements(&self) -> &[Value] {
        &self.scene.elements
    }

    /// Append a drawable element as an undoable step.
    pub fn add_element(&mut self, element: Value) {
        self.record();
        self.scene.elements.push(element);
    }

    /// Set a single view-state field as an undoable step.
    pub fn set_view_state(&mut self, key: impl Into<String>, value: Value) {
        self.record();
        self.scene.view_state.insert(key.into(), value);
    }

    /// Return to the scene before the last recorded step. Returns true if
    /// there was one.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };
        // Files are not part of history; keep what has been registered.
        let attachments = std::mem::take(&mut self.scene.attachments);
        self.scene = Scene {
            attachments,
            ..previous
        };
        true
    }

    /// Number of steps that can be undone.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Make subsequent exports fail, to exercise capture errors.
    pub fn set_fail_exports(&mut self, fail: bool) {
        self.fail_exports = fail;
    }

    /// Read-only access to the change log.
    pub fn events(&self) -> &[BoardEvent] {
        &self.events
    }

    /// Drain and return the change log.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self) {
        self.history.push(Scene {
            attachments: Default::default(),
            ..self.scene.clone()
        });
    }
}

impl Canvas for Board {
    fn export_scene(&self) -> Result<Scene, CanvasError> {
        if self.fail_exports {
            return Err(CanvasError::ExportFailed("board is not readable".into()));
        }
        Ok(self.scene.clone())
    }

    fn replace_scene(&mut self, update: SceneUpdate, capture: CaptureUpdate) {
        let recorded = capture == CaptureUpdate::Immediately;
        if recorded {
            self.record();
        }
        self.events.push(BoardEvent::SceneReplaced {
            elements: update.elements.len(),
            recorded,
        });
        self.scene.elements = update.elements;
        self.scene.view_state = update.view_state;
    }

    fn register_attachments(&mut self, files: Vec<BinaryFile>) {
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let Some(id) = file.id().map(str::to_owned) else {
                tracing::debug!("skipping attachment without an id");
                continue;
            };
            ids.push(id.clone());
            self.scene.attachments.insert(id, file);
        }
        self.events.push(BoardEvent::AttachmentsRegistered { ids });
    }
}
