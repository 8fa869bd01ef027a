use crate::config::VersioningConfig;
use crate::error::{LastError, VersionError};
use crate::version::{BoardVersion, VersionSummary};
use boardspace_canvas::{Canvas, CaptureUpdate, Scene};
use boardspace_common::{Clock, IdGenerator, SystemClock, VersionId};
use boardspace_persist::DurableStore;
use std::collections::HashSet;

/// Saved board versions, newest first, mirrored to a durable blob.
///
/// The store owns both the in-memory collection and the durable key it is
/// written under. Every mutation rewrites the whole blob; a mutation whose
/// write fails is rolled back so memory never runs ahead of storage.
///
/// Mutations take `&mut self`, so writes are applied strictly in the order
/// callers submit them.
pub struct VersionStore<C, S> {
    versions: Vec<BoardVersion>,
    canvas: Option<C>,
    durable: S,
    config: VersioningConfig,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    saving: bool,
    last_saved_id: Option<VersionId>,
    last_error: Option<LastError>,
}

impl<C: Canvas, S: DurableStore> VersionStore<C, S> {
    /// Load the collection from `durable` and attach `canvas` if present.
    ///
    /// A missing, empty, unreadable, or undecodable blob yields an empty
    /// collection; opening never fails.
    pub fn open(durable: S, canvas: Option<C>, config: VersioningConfig) -> Self {
        let versions = load_versions(&durable, &config.storage_key);
        tracing::info!(
            key = %config.storage_key,
            count = versions.len(),
            "opened version store"
        );
        Self {
            versions,
            canvas,
            durable,
            ids: config.id_strategy.generator(),
            clock: Box::new(SystemClock),
            config,
            saving: false,
            last_saved_id: None,
            last_error: None,
        }
    }

    /// Replace the id source.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Attach a canvas, returning the previous one.
    pub fn attach_canvas(&mut self, canvas: C) -> Option<C> {
        self.canvas.replace(canvas)
    }

    /// Detach and return the canvas. Saves and restores become no-ops.
    pub fn detach_canvas(&mut self) -> Option<C> {
        self.canvas.take()
    }

    pub fn has_canvas(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&C> {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut C> {
        self.canvas.as_mut()
    }

    /// Snapshot the canvas scene as a new version at the front of the list.
    ///
    /// Without a canvas this returns [`VersionError::CanvasUnavailable`] and
    /// changes nothing, not even the recorded error. Any other failure is
    /// recorded in [`Self::last_error`] and leaves the collection as it was.
    pub fn save(&mut self, label: Option<&str>) -> Result<VersionId, VersionError> {
        if self.canvas.is_none() {
            tracing::debug!("save skipped: no canvas attached");
            return Err(VersionError::CanvasUnavailable);
        }
        self.saving = true;
        self.last_error = None;

        let result = self.capture(label).and_then(|version| self.prepend(version));
        self.saving = false;

        match result {
            Ok(id) => {
                self.last_saved_id = Some(id.clone());
                Ok(id)
            }
            Err(err) => Err(self.record(err)),
        }
    }

    /// Put a saved version back on the canvas without adding an undo step.
    ///
    /// Returns false, touching nothing, when no canvas is attached or `id` is
    /// unknown.
    pub fn restore(&mut self, id: &VersionId) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            tracing::debug!(%id, "restore skipped: no canvas attached");
            return false;
        };
        let Some(version) = self.versions.iter().find(|v| &v.id == id) else {
            tracing::debug!(%id, "restore skipped: unknown version");
            return false;
        };

        canvas.replace_scene(version.scene.to_update(), CaptureUpdate::Never);
        // Scene replacement does not carry files; hand them over on their own.
        if !version.scene.attachments.is_empty() {
            canvas.register_attachments(version.scene.attachments.values().cloned().collect());
        }
        tracing::debug!(%id, label = %version.label, "restored version");
        true
    }

    /// Remove one version. Returns whether it existed.
    pub fn delete(&mut self, id: &VersionId) -> Result<bool, VersionError> {
        self.last_error = None;
        let Some(index) = self.versions.iter().position(|v| &v.id == id) else {
            return Ok(false);
        };

        let removed = self.versions.remove(index);
        if let Err(err) = self.persist() {
            self.versions.insert(index, removed);
            return Err(self.record(err));
        }
        tracing::info!(%id, label = %removed.label, "deleted version");
        Ok(true)
    }

    /// Remove every version.
    pub fn clear_all(&mut self) -> Result<(), VersionError> {
        self.last_error = None;
        let previous = std::mem::take(&mut self.versions);
        if let Err(err) = self.persist() {
            self.versions = previous;
            return Err(self.record(err));
        }
        tracing::info!(removed = previous.len(), "cleared all versions");
        Ok(())
    }

    /// Read-only access to the versions, newest first.
    pub fn versions(&self) -> &[BoardVersion] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn get(&self, id: &VersionId) -> Option<&BoardVersion> {
        self.versions.iter().find(|v| &v.id == id)
    }

    pub fn summary(&self, id: &VersionId) -> Option<VersionSummary> {
        self.get(id).map(BoardVersion::summary)
    }

    /// Whether a save is in progress.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Id of the most recent successful save in this session.
    pub fn last_saved_id(&self) -> Option<&VersionId> {
        self.last_saved_id.as_ref()
    }

    /// The failure recorded by the most recent fallible operation, if any.
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    pub fn storage_key(&self) -> &str {
        &self.config.storage_key
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Access the durable store.
    pub fn durable(&self) -> &S {
        &self.durable
    }

    pub fn durable_mut(&mut self) -> &mut S {
        &mut self.durable
    }

    fn capture(&self, label: Option<&str>) -> Result<BoardVersion, VersionError> {
        let canvas = self.canvas.as_ref().ok_or(VersionError::CanvasUnavailable)?;
        let mut scene = canvas.export_scene()?;
        prune_view_state(&mut scene, &self.config.prune_view_state);

        Ok(BoardVersion {
            id: self.fresh_id()?,
            label: resolve_label(label, &self.config.label_prefix, self.versions.len()),
            timestamp: self.clock.now(),
            scene,
        })
    }

    fn fresh_id(&self) -> Result<VersionId, VersionError> {
        let attempts = self.config.max_id_attempts.max(1);
        for _ in 0..attempts {
            let id = self.ids.generate();
            if self.get(&id).is_none() {
                return Ok(id);
            }
            tracing::warn!(%id, "generated version id already in use, retrying");
        }
        Err(VersionError::IdExhausted { attempts })
    }

    fn prepend(&mut self, version: BoardVersion) -> Result<VersionId, VersionError> {
        let id = version.id.clone();
        let label = version.label.clone();
        self.versions.insert(0, version);
        if let Err(err) = self.persist() {
            self.versions.remove(0);
            return Err(err);
        }
        tracing::info!(%id, %label, count = self.versions.len(), "saved version");
        Ok(id)
    }

    fn persist(&mut self) -> Result<(), VersionError> {
        let text = serde_json::to_string(&self.versions)?;
        self.durable.write_blob(&self.config.storage_key, &text)?;
        Ok(())
    }

    fn record(&mut self, err: VersionError) -> VersionError {
        tracing::warn!(kind = ?err.kind(), "{err}");
        self.last_error = Some(LastError::from(&err));
        err
    }
}

fn load_versions<S: DurableStore>(durable: &S, key: &str) -> Vec<BoardVersion> {
    let text = match durable.read_blob(key) {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, "failed to read stored versions: {e}");
            return Vec::new();
        }
    };
    let decoded: Vec<BoardVersion> = match serde_json::from_str(&text) {
        Ok(versions) => versions,
        Err(e) => {
            tracing::warn!(key, "failed to parse stored versions: {e}");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    decoded
        .into_iter()
        .filter(|v| {
            let fresh = seen.insert(v.id.clone());
            if !fresh {
                tracing::warn!(id = %v.id, "dropping stored version with duplicate id");
            }
            fresh
        })
        .collect()
}

fn resolve_label(label: Option<&str>, prefix: &str, existing: usize) -> String {
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_owned(),
        _ => format!("{prefix} {}", existing + 1),
    }
}

fn prune_view_state(scene: &mut Scene, keys: &[String]) {
    for key in keys {
        scene.view_state.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardspace_canvas::{Board, BoardEvent, CanvasError, SceneUpdate};
    use boardspace_common::SequentialIds;
    use boardspace_persist::MemoryStore;
    use serde_json::json;

    const KEY: &str = "boardspace.boardVersions";

    fn store_with(board: Board) -> VersionStore<Board, MemoryStore> {
        VersionStore::open(MemoryStore::new(), Some(board), VersioningConfig::default())
            .with_id_generator(SequentialIds::new("v"))
    }

    #[test]
    fn resolve_label_trims_or_counts() {
        assert_eq!(resolve_label(Some("  Milestone A  "), "Version", 4), "Milestone A");
        assert_eq!(resolve_label(Some("   "), "Version", 0), "Version 1");
        assert_eq!(resolve_label(None, "Snapshot", 2), "Snapshot 3");
    }

    #[test]
    fn save_prepends_and_persists() {
        let mut store = store_with(Board::new());
        let first = store.save(None).unwrap();
        let second = store.save(None).unwrap();

        let ids: Vec<_> = store.versions().iter().map(|v| v.id.clone()).collect();
        assert_eq!(ids, vec![second.clone(), first]);
        assert_eq!(store.last_saved_id(), Some(&second));
        assert_eq!(store.durable().write_count(), 2);
        assert!(!store.is_saving());
    }

    #[test]
    fn save_without_canvas_is_silent_noop() {
        let mut store: VersionStore<Board, MemoryStore> =
            VersionStore::open(MemoryStore::new(), None, VersioningConfig::default());
        assert!(matches!(
            store.save(Some("x")),
            Err(VersionError::CanvasUnavailable)
        ));
        assert!(store.is_empty());
        assert!(store.last_error().is_none());
        assert_eq!(store.durable().write_count(), 0);
    }

    #[test]
    fn colliding_ids_are_regenerated() {
        struct Repeats(std::sync::atomic::AtomicU32);
        impl IdGenerator for Repeats {
            fn generate(&self) -> VersionId {
                // Hands out "a", "a", "b", "b", ...
                let n = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                VersionId::new(((b'a' + (n / 2) as u8) as char).to_string())
            }
        }

        let mut store = store_with(Board::new()).with_id_generator(Repeats(Default::default()));
        assert_eq!(store.save(None).unwrap().as_str(), "a");
        assert_eq!(store.save(None).unwrap().as_str(), "b");
    }

    #[test]
    fn exhausted_ids_record_capture_failure() {
        struct Constant;
        impl IdGenerator for Constant {
            fn generate(&self) -> VersionId {
                VersionId::from("same")
            }
        }

        let mut store = store_with(Board::new()).with_id_generator(Constant);
        store.save(None).unwrap();
        let err = store.save(None).unwrap_err();
        assert!(matches!(err, VersionError::IdExhausted { attempts: 8 }));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.last_error().map(|e| e.kind),
            Some(crate::ErrorKind::CaptureFailure)
        );
    }

    #[test]
    fn pruned_view_state_keys_are_not_captured() {
        let mut board = Board::new();
        board.set_view_state("viewBackgroundColor", json!("#fff"));
        board.set_view_state("selectedElementIds", json!({"a": true}));
        let config = VersioningConfig {
            prune_view_state: vec!["selectedElementIds".into()],
            ..Default::default()
        };
        let mut store = VersionStore::open(MemoryStore::new(), Some(board), config);

        let id = store.save(None).unwrap();
        let view_state = &store.get(&id).unwrap().scene.view_state;
        assert!(view_state.contains_key("viewBackgroundColor"));
        assert!(!view_state.contains_key("selectedElementIds"));
    }

    #[test]
    fn restore_skips_history_and_registers_files() {
        let mut board = Board::from_scene(
            Scene::new(vec![json!({"id": "a"})], Default::default()).with_attachment(
                boardspace_canvas::BinaryFile::new("img", "image/png", "data:,"),
            ),
        );
        board.add_element(json!({"id": "b"}));
        let mut store = store_with(board);
        let id = store.save(None).unwrap();

        let canvas = store.canvas_mut().unwrap();
        canvas.replace_scene(SceneUpdate::default(), CaptureUpdate::Immediately);
        let history_before = canvas.history_len();
        canvas.drain_events();

        assert!(store.restore(&id));
        let canvas = store.canvas().unwrap();
        assert_eq!(canvas.elements().len(), 2);
        assert_eq!(canvas.history_len(), history_before);
        assert_eq!(
            canvas.events(),
            &[
                BoardEvent::SceneReplaced {
                    elements: 2,
                    recorded: false
                },
                BoardEvent::AttachmentsRegistered {
                    ids: vec!["img".into()]
                },
            ]
        );
    }

    #[test]
    fn restore_without_files_makes_one_call() {
        let mut board = Board::new();
        board.add_element(json!(1));
        let mut store = store_with(board);
        let id = store.save(None).unwrap();
        store.canvas_mut().unwrap().drain_events();

        assert!(store.restore(&id));
        assert_eq!(store.canvas().unwrap().events().len(), 1);
    }

    #[test]
    fn restore_unknown_id_touches_nothing() {
        let mut store = store_with(Board::new());
        store.save(None).unwrap();
        store.canvas_mut().unwrap().drain_events();

        assert!(!store.restore(&VersionId::from("missing")));
        assert!(store.canvas().unwrap().events().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_capture_leaves_collection_and_recovers() {
        let mut store = store_with(Board::new());
        store.save(None).unwrap();
        store.canvas_mut().unwrap().set_fail_exports(true);

        let err = store.save(None).unwrap_err();
        assert!(matches!(err, VersionError::Capture(CanvasError::ExportFailed(_))));
        assert_eq!(store.len(), 1);
        assert!(!store.is_saving());

        store.canvas_mut().unwrap().set_fail_exports(false);
        store.save(None).unwrap();
        assert!(store.last_error().is_none());
        assert_eq!(store.versions()[0].label, "Version 2");
    }

    #[test]
    fn failed_delete_keeps_memory_and_blob_in_step() {
        let mut store = store_with(Board::new());
        let a = store.save(None).unwrap();
        store.save(None).unwrap();
        let blob_before = store.durable().blob(KEY).map(str::to_owned);

        store.durable_mut().reject_writes(Some("read-only device"));
        assert!(store.delete(&a).is_err());
        assert_eq!(store.len(), 2);
        assert_eq!(store.versions()[1].id, a);
        assert_eq!(store.durable().blob(KEY).map(str::to_owned), blob_before);
    }

    #[test]
    fn failed_clear_restores_collection() {
        let mut store = store_with(Board::new());
        store.save(None).unwrap();
        store.durable_mut().reject_writes(Some("full"));

        assert!(store.clear_all().is_err());
        assert_eq!(store.len(), 1);
        assert!(store.last_error().is_some());
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let mut store = store_with(Board::new());
        store.save(None).unwrap();
        assert!(!store.delete(&VersionId::from("nope")).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.durable().write_count(), 1);
    }

    #[test]
    fn duplicate_ids_dropped_on_load() {
        let blob = r#"[
            {"id":"x","label":"new","timestamp":"2025-01-02T00:00:00.000Z","scene":{}},
            {"id":"x","label":"old","timestamp":"2025-01-01T00:00:00.000Z","scene":{}}
        ]"#;
        let store: VersionStore<Board, MemoryStore> = VersionStore::open(
            MemoryStore::with_blob(KEY, blob),
            None,
            VersioningConfig::default(),
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.versions()[0].label, "new");
    }

    #[test]
    fn attach_and_detach_canvas() {
        let mut store = store_with(Board::new());
        assert!(store.has_canvas());
        let board = store.detach_canvas().unwrap();
        assert!(matches!(store.save(None), Err(VersionError::CanvasUnavailable)));
        assert!(store.attach_canvas(board).is_none());
        assert!(store.save(None).is_ok());
    }
}
