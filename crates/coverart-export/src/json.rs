//! JSON export files and the file names derived from document names.

use coverart_core::{Document, Snapshot};
use serde::Serialize;

use crate::error::ExportResult;

/// A file ready to be written: suggested name plus contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Export the whole document as `{name}-config.json`.
pub fn document_export(doc: &Document) -> ExportResult<ExportFile> {
    Ok(ExportFile {
        file_name: format!("{}-config.json", dashed(&doc.name.to_lowercase())),
        contents: pretty(doc)?,
    })
}

/// Export a snapshot's document as `{snapshot name}-snapshot.json`.
pub fn snapshot_export(snapshot: &Snapshot) -> ExportResult<ExportFile> {
    Ok(ExportFile {
        file_name: format!("{}-snapshot.json", dashed(&snapshot.name)),
        contents: pretty(&snapshot.data)?,
    })
}

/// File name for a PNG export of `doc`.
pub fn png_file_name(doc: &Document) -> String {
    let stem = dashed(&doc.name.to_lowercase());
    if stem.is_empty() {
        "cover.png".to_string()
    } else {
        format!("{stem}.png")
    }
}

/// Replace each run of whitespace with a single dash.
fn dashed(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn pretty<T: Serialize>(value: &T) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverart_core::{SnapshotId, normalize_str};

    fn named(name: &str) -> Document {
        Document {
            name: name.to_string(),
            ..Document::new()
        }
    }

    #[test]
    fn document_file_name_is_lowercase_and_dashed() {
        let file = document_export(&named("My  Summer\tMix")).unwrap();
        assert_eq!(file.file_name, "my-summer-mix-config.json");
    }

    #[test]
    fn snapshot_file_name_keeps_case() {
        let snapshot = Snapshot {
            id: SnapshotId::from("s1"),
            name: "Revision 3".into(),
            timestamp: 0,
            data: named("Poster"),
            thumbnail: Some("data:image/png;base64,AA".into()),
        };
        let file = snapshot_export(&snapshot).unwrap();
        assert_eq!(file.file_name, "Revision-3-snapshot.json");
        // Only the document is exported, not the snapshot wrapper
        let value: serde_json::Value = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(value["name"], "Poster");
        assert!(value.get("thumbnail").is_none());
    }

    #[test]
    fn png_name_falls_back_to_cover() {
        assert_eq!(png_file_name(&named("Big Night")), "big-night.png");
        assert_eq!(png_file_name(&named("")), "cover.png");
    }

    #[test]
    fn export_is_pretty_and_reimportable() {
        let doc = named("Round Trip");
        let file = document_export(&doc).unwrap();
        assert!(file.contents.contains("\n  \"id\""));
        assert_eq!(normalize_str(&file.contents).unwrap(), doc);
    }
}
