//! Core types for coverart: the document schema, element variants, and the
//! migration that turns stored or imported JSON into that schema.

pub mod error;
pub mod fonts;
pub mod ids;
pub mod migrate;
pub mod model;

pub use error::{CoreError, CoreResult};
pub use fonts::{FONTS, Font};
pub use ids::{DocumentId, ElementId, SnapshotId};
pub use migrate::{normalize, normalize_background, normalize_element, normalize_str};
pub use model::{
    AspectRatio, Background, Document, Element, ElementBase, FontStyle, ImageElement, ShapeElement,
    ShapeType, Snapshot, TextAlign, TextElement, UNTITLED_NAME, now_millis,
};
