use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use coverart_export::{ExportFile, to_data_uri};

/// Read an import file as text
pub fn read_import(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read from {:?}", path))
}

/// Resolve an image argument. An existing file is read into a data URI; any
/// other argument (a data URI or a URL) is used as given.
pub fn image_source(arg: &str) -> Result<String> {
    let path = Path::new(arg);
    if !path.is_file() {
        return Ok(arg.to_string());
    }
    let mime = image_mime_type(path)
        .with_context(|| format!("{:?} is not a supported image file", path))?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read from {:?}", path))?;
    Ok(to_data_uri(mime, &bytes))
}

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// Where an output should go: `out` as a directory joins the suggested name,
/// any other `out` is the file itself, no `out` means the current directory.
pub fn resolve_output(out: Option<&Path>, suggested: &str) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(suggested),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(suggested),
    }
}

/// Write a JSON export, returning the path written
pub fn write_export(file: &ExportFile, out: Option<&Path>) -> Result<PathBuf> {
    let path = resolve_output(out, &file.file_name);
    fs::write(&path, &file.contents).with_context(|| format!("Failed to save to {:?}", path))?;
    Ok(path)
}

/// Write PNG bytes, returning the path written
pub fn write_png(bytes: &[u8], out: Option<&Path>, suggested: &str) -> Result<PathBuf> {
    let path = resolve_output(out, suggested);
    fs::write(&path, bytes).with_context(|| format!("Failed to save to {:?}", path))?;
    Ok(path)
}
