//! Export for coverart documents: pretty-printed JSON files and PNG images.

pub mod error;
pub mod json;
pub mod raster;

pub use error::{ExportError, ExportResult};
pub use json::{ExportFile, document_export, png_file_name, snapshot_export};
pub use raster::{
    BASE_CANVAS_WIDTH, PreviewRasterizer, RasterOptions, Rasterizer, render_data_uri,
    to_data_uri,
};
