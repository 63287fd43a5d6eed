//! Error types for exporting documents.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// The rasterizer could not produce an image for the document.
    #[error("render failed: {reason}")]
    RenderFailed { reason: String },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub fn render_failed(reason: impl Into<String>) -> Self {
        Self::RenderFailed {
            reason: reason.into(),
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
