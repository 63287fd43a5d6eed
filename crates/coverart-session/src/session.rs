//! The editing session: the live document plus everything that acts on it.
//!
//! `EditorSession` is the only way to change the document. Undoable operations
//! push the pre-mutation document onto the history stack before applying the
//! change. Every change marks the document dirty so the debounced autosave
//! writes it once edits pause.

use coverart_core::{
    AspectRatio, Background, Document, Element, ElementId, ImageElement, ShapeElement, ShapeType,
    Snapshot, SnapshotId, TextElement, normalize, normalize_background, normalize_element, normalize_str,
    now_millis,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::autosave::Debouncer;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult, StorageError};
use crate::history::HistoryStack;
use crate::snapshots::SnapshotStore;
use crate::storage::KeyValueStore;

/// Storage key for the live document
pub const DOCUMENT_KEY: &str = "coverart_current_project_v7";

/// Smallest width or height an element can be resized to, in pixels
pub const MIN_ELEMENT_SIZE: f64 = 20.0;

/// Outcome of the latest storage writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageStatus {
    #[default]
    Ok,
    /// A write was rejected for size. Stays set until a later write of the
    /// same key succeeds.
    LimitReached,
}

pub struct EditorSession<S: KeyValueStore> {
    document: Document,
    history: HistoryStack,
    snapshots: SnapshotStore,
    /// Single-slot clipboard
    clipboard: Option<Element>,
    selected: Option<ElementId>,
    /// Text element whose content is being edited
    editing: Option<ElementId>,
    autosave: Debouncer,
    store: S,
    /// Last write of [`DOCUMENT_KEY`]
    document_status: StorageStatus,
    /// Last write of the snapshot list
    snapshots_status: StorageStatus,
    config: SessionConfig,
}

impl<S: KeyValueStore> EditorSession<S> {
    /// Start with a blank document and no snapshots, ignoring stored state.
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            document: Document::new(),
            history: HistoryStack::new(config.history_limit),
            snapshots: SnapshotStore::new(config.snapshot_limit),
            clipboard: None,
            selected: None,
            editing: None,
            autosave: Debouncer::new(config.autosave_delay()),
            store,
            document_status: StorageStatus::Ok,
            snapshots_status: StorageStatus::Ok,
            config,
        }
    }

    /// Resume from stored state. A stored document that cannot be migrated is
    /// replaced by a blank one.
    pub fn open(store: S, config: SessionConfig) -> SessionResult<Self> {
        let snapshots = SnapshotStore::load(&store, config.snapshot_limit)?;
        let document = match store.get(DOCUMENT_KEY)? {
            Some(text) => match normalize_str(&text) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(error = %e, "Stored document is unreadable, starting fresh");
                    Document::new()
                }
            },
            None => Document::new(),
        };
        info!(
            document = %document.id,
            elements = document.elements.len(),
            snapshots = snapshots.len(),
            "Session opened"
        );

        let mut session = Self::new(store, config);
        session.document = document;
        session.snapshots = snapshots;
        Ok(session)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `LimitReached` while either the document or the snapshot list is
    /// stale in storage because of the quota.
    pub fn storage_status(&self) -> StorageStatus {
        if self.document_status == StorageStatus::LimitReached
            || self.snapshots_status == StorageStatus::LimitReached
        {
            StorageStatus::LimitReached
        } else {
            StorageStatus::Ok
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    pub fn editing(&self) -> Option<&ElementId> {
        self.editing.as_ref()
    }

    pub fn clipboard(&self) -> Option<&Element> {
        self.clipboard.as_ref()
    }

    // --- History ---

    /// Push the current document before an edit that does not push by itself.
    pub fn checkpoint(&mut self, label: &str) {
        self.history.push(label, &self.document);
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(&self.document) else {
            return false;
        };
        self.document = previous;
        self.clear_focus();
        self.mark_changed();
        true
    }

    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(&self.document) else {
            return false;
        };
        self.document = next;
        self.clear_focus();
        self.mark_changed();
        true
    }

    // --- Elements ---

    pub fn add_text(&mut self) -> ElementId {
        let z = self.next_z_index();
        self.insert_element("Add text", Element::Text(TextElement::fresh(z)))
    }

    pub fn add_shape(&mut self, shape_type: ShapeType) -> ElementId {
        let z = self.next_z_index();
        self.insert_element("Add shape", Element::Shape(ShapeElement::fresh(shape_type, z)))
    }

    pub fn add_image(&mut self, src: impl Into<String>) -> ElementId {
        let z = self.next_z_index();
        self.insert_element("Add image", Element::Image(ImageElement::fresh(src, z)))
    }

    /// Add a prepared element on top, giving it a fresh id.
    pub fn add_element(&mut self, mut element: Element) -> ElementId {
        let z = self.next_z_index();
        let base = element.base_mut();
        base.id = ElementId::new();
        base.z_index = z;
        self.insert_element("Add element", element)
    }

    /// Replace an element with an updated copy. Not recorded in history.
    pub fn update_element<F>(&mut self, id: &ElementId, f: F) -> SessionResult<()>
    where
        F: FnOnce(&mut Element),
    {
        let index = self.index_of(id)?;
        let mut updated = self.document.elements[index].clone();
        f(&mut updated);
        // The id is the element's identity
        updated.base_mut().id = id.clone();
        self.document.elements[index] = updated;
        self.mark_changed();
        Ok(())
    }

    /// Merge camelCase wire fields into an element and re-normalize it.
    /// Fields with the wrong type fall back to their defaults.
    pub fn patch_element(&mut self, id: &ElementId, fields: &Map<String, Value>) -> SessionResult<()> {
        let index = self.index_of(id)?;
        let current = &self.document.elements[index];
        let mut merged = match serde_json::to_value(current) {
            Ok(Value::Object(obj)) => obj,
            _ => Map::new(),
        };
        let kind = current.kind();
        for (key, value) in fields {
            if key != "id" && key != "type" {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.insert("id".into(), Value::from(id.as_str()));
        merged.insert("type".into(), Value::from(kind));

        let Some(patched) = normalize_element(&Value::Object(merged)) else {
            return Err(SessionError::ElementNotFound(id.clone()));
        };
        self.history.push("Edit element", &self.document);
        self.document.elements[index] = patched;
        self.mark_changed();
        Ok(())
    }

    /// Record history once at the start of a drag or resize gesture.
    pub fn begin_transform(&mut self, id: &ElementId) -> SessionResult<()> {
        self.index_of(id)?;
        self.history.push("Transform element", &self.document);
        Ok(())
    }

    /// Set the position in percent of the canvas. Pair with [`Self::begin_transform`].
    pub fn move_element(&mut self, id: &ElementId, x: f64, y: f64) -> SessionResult<()> {
        self.update_element(id, |el| {
            let base = el.base_mut();
            base.x = x;
            base.y = y;
        })
    }

    /// Set the size in pixels, clamped to [`MIN_ELEMENT_SIZE`].
    pub fn resize_element(&mut self, id: &ElementId, width: f64, height: f64) -> SessionResult<()> {
        self.update_element(id, |el| {
            let base = el.base_mut();
            base.width = width.max(MIN_ELEMENT_SIZE);
            base.height = height.max(MIN_ELEMENT_SIZE);
        })
    }

    pub fn remove_element(&mut self, id: &ElementId) -> SessionResult<()> {
        let index = self.index_of(id)?;
        self.history.push("Delete element", &self.document);
        self.document.elements.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        if self.editing.as_ref() == Some(id) {
            self.editing = None;
        }
        self.mark_changed();
        Ok(())
    }

    /// Move the layer at `from` to position `to`, keeping the others in order.
    pub fn reorder_element(&mut self, from: usize, to: usize) -> SessionResult<()> {
        let len = self.document.elements.len();
        for index in [from, to] {
            if index >= len {
                return Err(SessionError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        self.history.push("Reorder layers", &self.document);
        let element = self.document.elements.remove(from);
        self.document.elements.insert(to, element);
        self.mark_changed();
        Ok(())
    }

    // --- Background and canvas ---

    /// Edit background fields. Not recorded in history.
    pub fn update_background<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Background),
    {
        let mut background = self.document.background.clone();
        f(&mut background);
        self.document.background = background;
        self.mark_changed();
    }

    /// Merge camelCase wire fields into the background and re-normalize it.
    pub fn patch_background(&mut self, fields: &Map<String, Value>) {
        let mut merged = match serde_json::to_value(&self.document.background) {
            Ok(Value::Object(obj)) => obj,
            _ => Map::new(),
        };
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
        let patched = normalize_background(&Value::Object(merged));
        self.history.push("Edit background", &self.document);
        self.document.background = patched;
        self.mark_changed();
    }

    pub fn set_background_image(&mut self, data_uri: impl Into<String>) {
        self.history.push("Set background image", &self.document);
        self.document.background.image_value = data_uri.into();
        self.document.background.image_opacity = 1.0;
        self.mark_changed();
    }

    pub fn clear_background_image(&mut self) {
        self.history.push("Remove background image", &self.document);
        self.document.background.image_value.clear();
        self.mark_changed();
    }

    pub fn rename_document(&mut self, name: impl Into<String>) {
        self.history.push("Rename project", &self.document);
        self.document.name = name.into();
        self.mark_changed();
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        if self.document.aspect_ratio == ratio {
            return;
        }
        self.history.push("Change aspect ratio", &self.document);
        self.document.aspect_ratio = ratio;
        self.mark_changed();
    }

    // --- Clipboard ---

    pub fn copy_element(&mut self, id: &ElementId) -> SessionResult<()> {
        let element = self
            .document
            .element(id)
            .ok_or_else(|| SessionError::ElementNotFound(id.clone()))?;
        debug!(element = %id, "Copied element");
        self.clipboard = Some(element.clone());
        Ok(())
    }

    /// Copy the selected element. Returns false when nothing is selected.
    pub fn copy_selected(&mut self) -> bool {
        match self.selected.clone() {
            Some(id) => self.copy_element(&id).is_ok(),
            None => false,
        }
    }

    /// Paste the clipboard as a new, offset element. `None` when the clipboard is empty.
    pub fn paste(&mut self) -> Option<ElementId> {
        let offset = self.config.paste_offset;
        let copy = self.clipboard.as_ref()?.duplicated(offset, offset);
        Some(self.insert_element("Paste element", copy))
    }

    pub fn duplicate_element(&mut self, id: &ElementId) -> SessionResult<ElementId> {
        let offset = self.config.paste_offset;
        let copy = self
            .document
            .element(id)
            .ok_or_else(|| SessionError::ElementNotFound(id.clone()))?
            .duplicated(offset, offset);
        Ok(self.insert_element("Duplicate element", copy))
    }

    // --- Selection ---

    pub fn select(&mut self, id: &ElementId) -> SessionResult<()> {
        self.index_of(id)?;
        if self.editing.as_ref().is_some_and(|editing| editing != id) {
            self.editing = None;
        }
        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.clear_focus();
    }

    /// Focus a text element for content editing.
    pub fn begin_text_edit(&mut self, id: &ElementId) -> SessionResult<()> {
        match self.document.element(id) {
            Some(Element::Text(_)) => {
                self.selected = Some(id.clone());
                self.editing = Some(id.clone());
                Ok(())
            }
            _ => Err(SessionError::ElementNotFound(id.clone())),
        }
    }

    pub fn end_text_edit(&mut self) {
        self.editing = None;
    }

    // --- Whole-document operations ---

    /// Replace the document with migrated import text. On failure the
    /// document is unchanged.
    pub fn import_json(&mut self, text: &str) -> SessionResult<()> {
        let mut imported = normalize_str(text).map_err(SessionError::ImportInvalid)?;
        imported.last_modified = now_millis();
        info!(
            document = %imported.id,
            elements = imported.elements.len(),
            "Imported document"
        );
        self.replace_document("Import project", imported);
        Ok(())
    }

    /// Start over with a blank document and empty history.
    pub fn new_document(&mut self) {
        self.document = Document::new();
        self.history.clear();
        self.clear_focus();
        self.mark_changed();
    }

    // --- Snapshots ---

    pub fn snapshots(&self) -> &[Snapshot] {
        self.snapshots.list()
    }

    pub fn snapshot(&self, id: &SnapshotId) -> Option<&Snapshot> {
        self.snapshots.get(id)
    }

    /// Capture the live document. `thumbnail` is best effort and may be absent.
    pub fn capture_snapshot(&mut self, thumbnail: Option<String>) -> SnapshotId {
        let id = self.snapshots.capture(&self.document, thumbnail).id.clone();
        self.persist_snapshots();
        id
    }

    /// Make a snapshot's document live. Undoable.
    pub fn restore_snapshot(&mut self, id: &SnapshotId) -> SessionResult<()> {
        let snapshot = self
            .snapshots
            .get(id)
            .ok_or_else(|| SessionError::SnapshotNotFound(id.clone()))?;
        let mut restored =
            normalize(&snapshot.data.to_json_value()).map_err(|source| SessionError::RestoreFailed {
                id: id.clone(),
                source,
            })?;
        restored.last_modified = now_millis();
        info!(snapshot = %id, name = %snapshot.name, "Restoring snapshot");
        self.replace_document("Restore snapshot", restored);
        Ok(())
    }

    pub fn delete_snapshot(&mut self, id: &SnapshotId) -> SessionResult<()> {
        if !self.snapshots.remove(id) {
            return Err(SessionError::SnapshotNotFound(id.clone()));
        }
        self.persist_snapshots();
        Ok(())
    }

    pub fn rename_snapshot(&mut self, id: &SnapshotId, name: impl Into<String>) -> SessionResult<()> {
        if !self.snapshots.rename(id, name) {
            return Err(SessionError::SnapshotNotFound(id.clone()));
        }
        self.persist_snapshots();
        Ok(())
    }

    // --- Persistence ---

    /// Write the document if the autosave delay has passed since the last
    /// change. Returns whether a write happened.
    pub fn tick(&mut self) -> SessionResult<bool> {
        if !self.autosave.should_flush() {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Write the document now if it has unsaved changes. A failed write is not
    /// retried; the in-memory document stays authoritative.
    pub fn flush(&mut self) -> SessionResult<()> {
        if !self.autosave.is_dirty() {
            return Ok(());
        }
        self.autosave.mark_flushed();
        let result = serde_json::to_string(&self.document)
            .map_err(StorageError::from)
            .and_then(|text| self.store.set(DOCUMENT_KEY, &text));
        record_write(&mut self.document_status, &result);
        if result.is_ok() {
            debug!(document = %self.document.id, "Document saved");
        }
        result.map_err(SessionError::from)
    }

    fn persist_snapshots(&mut self) {
        let result = self.snapshots.persist(&mut self.store);
        record_write(&mut self.snapshots_status, &result);
        if let Err(e) = result {
            warn!(error = %e, "Snapshot list not saved; keeping it in memory");
        }
    }

    // --- Internals ---

    fn index_of(&self, id: &ElementId) -> SessionResult<usize> {
        self.document
            .position_of(id)
            .ok_or_else(|| SessionError::ElementNotFound(id.clone()))
    }

    fn next_z_index(&self) -> i64 {
        self.document.elements.len() as i64
    }

    fn insert_element(&mut self, label: &str, element: Element) -> ElementId {
        self.history.push(label, &self.document);
        let id = element.id().clone();
        debug!(element = %id, kind = element.kind(), "{label}");
        self.document.elements.push(element);
        self.selected = Some(id.clone());
        self.editing = None;
        self.mark_changed();
        id
    }

    fn replace_document(&mut self, label: &str, document: Document) {
        self.history.push(label, &self.document);
        self.document = document;
        self.clear_focus();
        self.mark_changed();
    }

    fn clear_focus(&mut self) {
        self.selected = None;
        self.editing = None;
    }

    fn mark_changed(&mut self) {
        self.autosave.mark_dirty();
    }
}

fn record_write(status: &mut StorageStatus, result: &Result<(), StorageError>) {
    match result {
        Ok(()) => *status = StorageStatus::Ok,
        Err(StorageError::QuotaExceeded { .. }) => *status = StorageStatus::LimitReached,
        Err(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn session() -> EditorSession<MemoryStore> {
        EditorSession::new(MemoryStore::new(), SessionConfig::default())
    }

    #[test]
    fn add_text_selects_and_pushes_history() {
        let mut s = session();
        let id = s.add_text();
        assert_eq!(s.selected(), Some(&id));
        assert_eq!(s.history().undo_count(), 1);
        assert_eq!(s.document().elements.len(), 1);
        assert_eq!(s.document().elements[0].base().z_index, 0);

        let second = s.add_shape(ShapeType::Line);
        let Element::Shape(shape) = s.document().element(&second).unwrap() else {
            panic!("expected a shape");
        };
        assert_eq!(shape.base.z_index, 1);
        assert_eq!((shape.base.width, shape.base.height), (300.0, 4.0));
        assert_eq!(shape.fill, "transparent");
    }

    #[test]
    fn add_element_assigns_a_fresh_id() {
        let mut s = session();
        let first = s.add_image("data:image/png;base64,AA");
        let copy = s.document().element(&first).unwrap().clone();
        let second = s.add_element(copy);
        assert_ne!(first, second);
        assert_eq!(s.document().elements[1].base().z_index, 1);
    }

    #[test]
    fn update_element_is_not_undoable_but_patch_is() {
        let mut s = session();
        let id = s.add_text();
        s.update_element(&id, |el| el.base_mut().opacity = 0.5).unwrap();
        assert_eq!(s.history().undo_count(), 1);

        let fields = json!({ "content": "HELLO", "fontSize": "big", "id": "hijack" });
        s.patch_element(&id, fields.as_object().unwrap()).unwrap();
        assert_eq!(s.history().undo_count(), 2);
        let Element::Text(text) = s.document().element(&id).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(text.content, "HELLO");
        assert_eq!(text.font_size, 40.0);
        assert_eq!(text.base.opacity, 0.5);

        assert!(s.undo());
        let Element::Text(text) = s.document().element(&id).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(text.content, "NEW TEXT");
    }

    #[test]
    fn transform_gesture_pushes_once() {
        let mut s = session();
        let id = s.add_shape(ShapeType::Rect);
        s.begin_transform(&id).unwrap();
        s.move_element(&id, 30.0, 40.0).unwrap();
        s.move_element(&id, 35.0, 45.0).unwrap();
        s.resize_element(&id, 5.0, 500.0).unwrap();
        assert_eq!(s.history().undo_count(), 2);

        let base = s.document().element(&id).unwrap().base().clone();
        assert_eq!((base.x, base.y), (35.0, 45.0));
        assert_eq!((base.width, base.height), (MIN_ELEMENT_SIZE, 500.0));

        s.undo();
        let base = s.document().element(&id).unwrap().base().clone();
        assert_eq!((base.x, base.y), (25.0, 25.0));
    }

    #[test]
    fn unknown_element_ids_are_errors() {
        let mut s = session();
        let missing = ElementId::from("missing");
        assert!(matches!(
            s.remove_element(&missing),
            Err(SessionError::ElementNotFound(_))
        ));
        assert!(s.move_element(&missing, 1.0, 1.0).is_err());
        assert!(s.select(&missing).is_err());
        assert!(s.duplicate_element(&missing).is_err());
        assert_eq!(s.history().undo_count(), 0);
    }

    #[test]
    fn remove_clears_selection() {
        let mut s = session();
        let id = s.add_text();
        s.begin_text_edit(&id).unwrap();
        s.remove_element(&id).unwrap();
        assert!(s.selected().is_none());
        assert!(s.editing().is_none());
        assert!(s.document().elements.is_empty());
    }

    #[test]
    fn reorder_out_of_range_is_rejected() {
        let mut s = session();
        s.add_text();
        assert!(matches!(
            s.reorder_element(0, 3),
            Err(SessionError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn undo_and_redo_clear_selection() {
        let mut s = session();
        let id = s.add_text();
        s.select(&id).unwrap();
        assert!(s.undo());
        assert!(s.selected().is_none());
        assert!(s.redo());
        assert!(s.selected().is_none());
        assert!(s.document().element(&id).is_some());
        assert!(!s.redo());
    }

    #[test]
    fn background_image_set_and_clear() {
        let mut s = session();
        s.update_background(|bg| bg.image_opacity = 0.3);
        assert_eq!(s.history().undo_count(), 0);

        s.set_background_image("data:image/png;base64,AA");
        assert_eq!(s.document().background.image_opacity, 1.0);
        assert!(s.document().background.has_image());

        s.clear_background_image();
        assert!(!s.document().background.has_image());
        s.undo();
        assert!(s.document().background.has_image());
    }

    #[test]
    fn background_patch_is_undoable_and_normalized() {
        let mut s = session();
        let before = s.document().background.clone();
        let mut fields = Map::new();
        fields.insert("imageRotation".into(), json!(30));
        fields.insert("fillOpacity".into(), json!(4));
        s.patch_background(&fields);

        let bg = &s.document().background;
        assert_eq!(bg.image_rotation, 30.0);
        assert_eq!(bg.fill_opacity, 1.0);
        assert_eq!(bg.fill_value, before.fill_value);
        assert_eq!(bg.image_opacity, before.image_opacity);
        assert!(s.is_dirty());

        assert!(s.undo());
        assert_eq!(s.document().background, before);
    }

    #[test]
    fn copy_selected_requires_a_selection() {
        let mut s = session();
        assert!(!s.copy_selected());
        assert!(s.paste().is_none());
        let id = s.add_text();
        assert!(s.copy_selected());
        assert_eq!(s.clipboard().map(|el| el.id()), Some(&id));
    }

    #[test]
    fn text_edit_only_on_text_elements() {
        let mut s = session();
        let shape = s.add_shape(ShapeType::Star);
        assert!(s.begin_text_edit(&shape).is_err());
        let text = s.add_text();
        s.begin_text_edit(&text).unwrap();
        s.select(&shape).unwrap();
        assert!(s.editing().is_none());
    }

    #[test]
    fn ending_text_edit_keeps_the_selection() {
        let mut s = session();
        let text = s.add_text();
        s.begin_text_edit(&text).unwrap();
        s.end_text_edit();
        assert!(s.editing().is_none());
        assert_eq!(s.selected(), Some(&text));

        s.begin_text_edit(&text).unwrap();
        s.clear_selection();
        assert!(s.selected().is_none());
        assert!(s.editing().is_none());
    }

    #[test]
    fn new_document_clears_history() {
        let mut s = session();
        s.add_text();
        s.rename_document("Poster");
        s.new_document();
        assert!(!s.history().can_undo());
        assert!(s.document().elements.is_empty());
    }

    #[test]
    fn failed_import_leaves_document_unchanged() {
        let mut s = session();
        s.add_text();
        let before = s.document().clone();
        assert!(matches!(s.import_json("{oops"), Err(SessionError::ImportInvalid(_))));
        assert!(matches!(s.import_json("[1,2]"), Err(SessionError::ImportInvalid(_))));
        assert_eq!(s.document(), &before);
        assert_eq!(s.history().undo_count(), 1);
    }

    #[test]
    fn flush_writes_only_when_dirty() {
        let mut s = session();
        s.flush().unwrap();
        assert!(s.store().get(DOCUMENT_KEY).unwrap().is_none());

        s.rename_document("Saved");
        assert!(s.is_dirty());
        s.flush().unwrap();
        assert!(!s.is_dirty());
        let stored = s.store().get(DOCUMENT_KEY).unwrap().unwrap();
        assert_eq!(normalize_str(&stored).unwrap(), *s.document());
    }

    #[test]
    fn open_resumes_stored_state() {
        let mut s = session();
        s.add_text();
        s.rename_document("Resumed");
        s.capture_snapshot(None);
        s.flush().unwrap();
        let store = s.store().clone();

        let reopened = EditorSession::open(store, SessionConfig::default()).unwrap();
        assert_eq!(reopened.document().name, "Resumed");
        assert_eq!(reopened.snapshots().len(), 1);
        assert!(!reopened.history().can_undo());
    }

    #[test]
    fn open_with_corrupt_document_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(DOCUMENT_KEY, "not json").unwrap();
        let s = EditorSession::open(store, SessionConfig::default()).unwrap();
        assert!(s.document().elements.is_empty());
    }

    #[test]
    fn snapshot_operations_report_missing_ids() {
        let mut s = session();
        let missing = SnapshotId::from("missing");
        assert!(matches!(
            s.restore_snapshot(&missing),
            Err(SessionError::SnapshotNotFound(_))
        ));
        assert!(s.delete_snapshot(&missing).is_err());
        assert!(s.rename_snapshot(&missing, "x").is_err());

        let id = s.capture_snapshot(None);
        s.rename_snapshot(&id, "Final").unwrap();
        assert_eq!(s.snapshot(&id).unwrap().name, "Final");
        s.delete_snapshot(&id).unwrap();
        assert!(s.snapshots().is_empty());
    }
}
