use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use coverart_core::fonts::find_font;
use coverart_core::{Element, ElementId, FONTS, Snapshot, SnapshotId};
use coverart_export::{
    PreviewRasterizer, RasterOptions, Rasterizer, document_export, png_file_name, render_data_uri,
    snapshot_export,
};
use coverart_session::{EditorSession, FileStore, StorageStatus};
use serde_json::Map;
use tracing::{info, warn};

use crate::commands::{EditCommand, HELP};
use crate::config::Config;
use crate::file_io;

/// Main application state
pub struct App {
    /// The editing session - owns the live document
    pub session: EditorSession<FileStore>,
    rasterizer: Box<dyn Rasterizer>,
    config: Config,
    pub status_message: Option<String>,
    /// Whether the current storage warning has been shown
    storage_warned: bool,
}

impl App {
    /// Open the session stored under the configured data directory
    pub fn open(config: Config) -> Result<Self> {
        let dir = config.data_dir();
        let store = FileStore::new(&dir).with_quota(config.storage_quota_bytes);
        let session = EditorSession::open(store, config.session_config())
            .with_context(|| format!("Failed to open session in {:?}", dir))?;
        Ok(Self::with_session(session, config, Box::new(PreviewRasterizer::new())))
    }

    pub fn with_session(
        session: EditorSession<FileStore>,
        config: Config,
        rasterizer: Box<dyn Rasterizer>,
    ) -> Self {
        Self {
            session,
            rasterizer,
            config,
            status_message: None,
            storage_warned: false,
        }
    }

    /// Set a status message to display
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Take the pending status message, adding the storage warning when it is new
    pub fn take_status(&mut self) -> Option<String> {
        match self.session.storage_status() {
            StorageStatus::LimitReached if !self.storage_warned => {
                self.storage_warned = true;
                let warning = "Storage limit reached: changes are kept in memory only";
                self.status_message = Some(match self.status_message.take() {
                    Some(msg) => format!("{msg}\n{warning}"),
                    None => warning.to_string(),
                });
            }
            StorageStatus::Ok => self.storage_warned = false,
            StorageStatus::LimitReached => {}
        }
        self.status_message.take()
    }

    /// Save the document if edits have paused long enough
    pub fn autosave(&mut self) {
        if let Err(e) = self.session.tick() {
            self.set_status(format!("Autosave error: {}", e));
        }
    }

    /// Save now
    pub fn flush(&mut self) -> Result<()> {
        self.session.flush().context("Failed to save document")
    }

    // --- Boundary operations ---

    pub fn import_file(&mut self, path: &Path) -> Result<()> {
        let text = file_io::read_import(path)?;
        self.session
            .import_json(&text)
            .with_context(|| format!("Failed to import {:?}", path))?;
        let doc = self.session.document();
        let msg = format!("Imported '{}' ({} elements)", doc.name, doc.elements.len());
        self.set_status(msg);
        Ok(())
    }

    pub fn export_json(&mut self, out: Option<&Path>) -> Result<PathBuf> {
        let file = document_export(self.session.document())?;
        let path = file_io::write_export(&file, out)?;
        self.set_status(format!("Exported {}", path.display()));
        Ok(path)
    }

    pub fn export_snapshot(&mut self, snapshot: &str, out: Option<&Path>) -> Result<PathBuf> {
        let snapshot = self.find_snapshot(snapshot)?;
        let file = snapshot_export(snapshot)?;
        let path = file_io::write_export(&file, out)?;
        self.set_status(format!("Exported {}", path.display()));
        Ok(path)
    }

    /// Render the document to PNG. A failure leaves the document as it was.
    pub async fn export_png(
        &mut self,
        out: Option<&Path>,
        pixel_ratio: Option<f64>,
    ) -> Result<PathBuf> {
        let options = pixel_ratio
            .map(|pixel_ratio| RasterOptions { pixel_ratio })
            .unwrap_or_else(|| self.config.export_options());
        let doc = self.session.document();
        let png = self
            .rasterizer
            .rasterize(doc, options)
            .await
            .context("Failed to render PNG")?;
        let path = file_io::write_png(&png, out, &png_file_name(doc))?;
        self.set_status(format!("Rendered {}", path.display()));
        Ok(path)
    }

    /// Capture a snapshot. A failed thumbnail only means no thumbnail.
    pub async fn capture(&mut self) -> SnapshotId {
        let thumbnail = match render_data_uri(
            self.rasterizer.as_ref(),
            self.session.document(),
            self.config.thumbnail_options(),
        )
        .await
        {
            Ok(uri) => Some(uri),
            Err(e) => {
                warn!(error = %e, "Thumbnail failed, capturing without one");
                None
            }
        };
        let id = self.session.capture_snapshot(thumbnail);
        if let Some(snapshot) = self.session.snapshot(&id) {
            let msg = format!("Captured '{}'", snapshot.name);
            self.set_status(msg);
        }
        id
    }

    pub fn restore(&mut self, snapshot: &str) -> Result<()> {
        let id = self.find_snapshot(snapshot)?.id.clone();
        self.session.restore_snapshot(&id)?;
        info!(snapshot = %id, "Restored snapshot");
        self.set_status(format!("Restored {}", id));
        Ok(())
    }

    pub fn rename_snapshot(&mut self, snapshot: &str, name: &str) -> Result<()> {
        let id = self.find_snapshot(snapshot)?.id.clone();
        self.session.rename_snapshot(&id, name)?;
        Ok(())
    }

    pub fn delete_snapshot(&mut self, snapshot: &str) -> Result<()> {
        let id = self.find_snapshot(snapshot)?.id.clone();
        self.session.delete_snapshot(&id)?;
        Ok(())
    }

    /// Look up a snapshot by list position (0 is newest) or by id
    pub fn find_snapshot(&self, key: &str) -> Result<&Snapshot> {
        let snapshots = self.session.snapshots();
        if let Some(snapshot) = key.parse::<usize>().ok().and_then(|i| snapshots.get(i)) {
            return Ok(snapshot);
        }
        snapshots
            .iter()
            .find(|s| s.id.as_str() == key)
            .with_context(|| format!("No snapshot '{}'", key))
    }

    // --- Interactive editing ---

    /// Apply one edit command. Returns false when the loop should stop.
    pub async fn apply(&mut self, command: EditCommand) -> Result<bool> {
        match command {
            EditCommand::Text => {
                self.session.add_text();
            }
            EditCommand::Shape(shape_type) => {
                self.session.add_shape(shape_type);
            }
            EditCommand::Image(src) => {
                self.session.add_image(file_io::image_source(&src)?);
            }
            EditCommand::Move { layer, x, y } => {
                let id = self.layer_id(layer)?;
                self.session.begin_transform(&id)?;
                self.session.move_element(&id, x, y)?;
            }
            EditCommand::Resize { layer, width, height } => {
                let id = self.layer_id(layer)?;
                self.session.begin_transform(&id)?;
                self.session.resize_element(&id, width, height)?;
            }
            EditCommand::Set { layer, field, value } => {
                let id = self.layer_id(layer)?;
                let mut fields = Map::new();
                fields.insert(field, value);
                self.session.patch_element(&id, &fields)?;
            }
            EditCommand::Font { layer, name } => {
                let id = self.layer_id(layer)?;
                let font = find_font(&name).with_context(|| format!("Unknown font '{}'", name))?;
                if !matches!(self.session.document().element(&id), Some(Element::Text(_))) {
                    bail!("Layer {} is not text", layer);
                }
                self.session.checkpoint("Change font");
                self.session.update_element(&id, |el| {
                    if let Element::Text(text) = el {
                        text.font_family = font.value.to_string();
                    }
                })?;
            }
            EditCommand::Remove(layer) => {
                let id = self.layer_id(layer)?;
                self.session.remove_element(&id)?;
            }
            EditCommand::Reorder { from, to } => self.session.reorder_element(from, to)?,
            EditCommand::Select(layer) => {
                let id = self.layer_id(layer)?;
                self.session.select(&id)?;
            }
            EditCommand::Copy(layer) => {
                let id = self.layer_id(layer)?;
                self.session.copy_element(&id)?;
                self.set_status("Copied");
            }
            EditCommand::Paste => {
                if self.session.paste().is_none() {
                    self.set_status("Clipboard is empty");
                }
            }
            EditCommand::Duplicate(layer) => {
                let id = self.layer_id(layer)?;
                self.session.duplicate_element(&id)?;
            }
            EditCommand::Background(fill) => {
                self.session.checkpoint("Change background");
                self.session.update_background(|bg| bg.fill_value = fill);
            }
            EditCommand::BackgroundSet { field, value } => {
                let mut fields = Map::new();
                fields.insert(field, value);
                self.session.patch_background(&fields);
            }
            EditCommand::BackgroundImage(src) => {
                self.session.set_background_image(file_io::image_source(&src)?)
            }
            EditCommand::ClearBackgroundImage => self.session.clear_background_image(),
            EditCommand::Name(name) => self.session.rename_document(name),
            EditCommand::Ratio(ratio) => self.session.set_aspect_ratio(ratio),
            EditCommand::Undo => {
                if !self.session.undo() {
                    self.set_status("Nothing to undo");
                }
            }
            EditCommand::Redo => {
                if !self.session.redo() {
                    self.set_status("Nothing to redo");
                }
            }
            EditCommand::Capture => {
                self.capture().await;
            }
            EditCommand::Restore(index) => self.restore(&index.to_string())?,
            EditCommand::DeleteSnapshot(index) => self.delete_snapshot(&index.to_string())?,
            EditCommand::RenameSnapshot { index, name } => {
                self.rename_snapshot(&index.to_string(), &name)?
            }
            EditCommand::List => {
                let listing = format!("{}{}", self.describe(), self.snapshot_list());
                self.set_status(listing.trim_end().to_string());
            }
            EditCommand::Fonts => {
                let names: Vec<_> = FONTS.iter().map(|f| f.name).collect();
                self.set_status(names.join(", "));
            }
            EditCommand::Save => {
                self.flush()?;
                self.set_status("Saved");
            }
            EditCommand::Help => self.set_status(HELP),
            EditCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn layer_id(&self, layer: usize) -> Result<ElementId> {
        let elements = &self.session.document().elements;
        elements
            .get(layer)
            .map(|el| el.id().clone())
            .with_context(|| format!("No layer {} ({} layers)", layer, elements.len()))
    }

    // --- Listings ---

    /// Document summary with one line per layer, bottom first
    pub fn describe(&self) -> String {
        let doc = self.session.document();
        let bg = &doc.background;
        let mut out = String::new();
        let _ = writeln!(out, "{} [{}] {}", doc.name, doc.aspect_ratio, doc.id);
        let _ = writeln!(
            out,
            "background: {} ({:.0}%){}",
            bg.fill_value,
            bg.fill_opacity * 100.0,
            if bg.has_image() { " + image" } else { "" }
        );
        let selected = self.session.selected();
        for (i, el) in doc.elements.iter().enumerate() {
            let base = el.base();
            let marker = if selected == Some(el.id()) { '*' } else { ' ' };
            let _ = writeln!(
                out,
                "{marker}{i:>3} {:<20} at ({:.1}%, {:.1}%) {:.0}x{:.0}",
                el.label(),
                base.x,
                base.y,
                base.width,
                base.height
            );
        }
        let history = self.session.history();
        let _ = writeln!(
            out,
            "history: {} undo, {} redo",
            history.undo_count(),
            history.redo_count()
        );
        out
    }

    /// One line per snapshot, newest first
    pub fn snapshot_list(&self) -> String {
        let mut out = String::new();
        for (i, snap) in self.session.snapshots().iter().enumerate() {
            let _ = writeln!(
                out,
                "{i:>3} {:<20} {} elements{}  {}",
                snap.name,
                snap.data.elements.len(),
                if snap.thumbnail.is_some() { ", thumbnail" } else { "" },
                snap.id
            );
        }
        out
    }
}
