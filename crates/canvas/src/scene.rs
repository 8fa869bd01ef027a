use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Flat record of rendering/UI state, kept as raw JSON.
pub type ViewState = Map<String, Value>;

/// Everything a canvas exports: drawable elements, view-state, and binary files.
///
/// Field names on the wire follow the host canvas (`appState`, `files`) so
/// persisted scenes stay interchangeable with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(rename = "appState", default)]
    pub view_state: ViewState,
    #[serde(rename = "files", default)]
    pub attachments: BTreeMap<String, BinaryFile>,
}

impl Scene {
    pub fn new(elements: Vec<Value>, view_state: ViewState) -> Self {
        Self {
            elements,
            view_state,
            attachments: BTreeMap::new(),
        }
    }

    /// Add a binary file, keyed by its own id (empty if it has none).
    pub fn with_attachment(mut self, file: BinaryFile) -> Self {
        let id = file.id().unwrap_or_default().to_owned();
        self.attachments.insert(id, file);
        self
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// The part of the scene a canvas accepts as a replacement.
    pub fn to_update(&self) -> SceneUpdate {
        SceneUpdate {
            elements: self.elements.clone(),
            view_state: self.view_state.clone(),
        }
    }
}

/// Elements and view-state handed to [`crate::Canvas::replace_scene`].
///
/// Attachments travel separately through `register_attachments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneUpdate {
    pub elements: Vec<Value>,
    #[serde(rename = "appState")]
    pub view_state: ViewState,
}

/// Binary payload attached to a scene (images and the like).
///
/// Kept as the raw JSON the canvas produced so it goes back out unmodified;
/// the accessors only read the fields hosts commonly write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryFile(Value);

impl BinaryFile {
    pub fn new(id: impl Into<String>, mime_type: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self(json!({
            "id": id.into(),
            "mimeType": mime_type.into(),
            "dataURL": data_url.into(),
        }))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn id(&self) -> Option<&str> {
        self.field("id")
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.field("mimeType")
    }

    pub fn data_url(&self) -> Option<&str> {
        self.field("dataURL")
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

/// Whether a scene replacement is recorded as an undoable step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureUpdate {
    #[default]
    Immediately,
    Never,
}
