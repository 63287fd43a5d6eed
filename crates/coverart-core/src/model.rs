//! Document schema - the canonical shape every load, import, and restore
//! ends up in after migration.
//!
//! Elements are a closed sum type tagged by `type`; the fields every variant
//! shares live in [`ElementBase`] and are flattened into the variant record on
//! the wire.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::fonts::{DEFAULT_FONT_WEIGHT, default_font};
use crate::ids::{DocumentId, ElementId, SnapshotId};

/// Name given to documents that have none
pub const UNTITLED_NAME: &str = "UNTITLED_COVER";

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Canvas aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "9:16")]
    Story,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Story,
        AspectRatio::Widescreen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "4:5",
            AspectRatio::Story => "9:16",
            AspectRatio::Widescreen => "16:9",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// (width, height) ratio terms
    pub fn terms(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1, 1),
            AspectRatio::Portrait => (4, 5),
            AspectRatio::Story => (9, 16),
            AspectRatio::Widescreen => (16, 9),
        }
    }

    /// Pixel dimensions for a canvas `width` pixels wide
    pub fn dimensions(self, width: u32) -> (u32, u32) {
        let (w, h) = self.terms();
        (width, (width as u64 * h as u64 / w as u64).max(1) as u32)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown aspect ratio '{s}' (expected 1:1, 4:5, 9:16 or 16:9)"))
    }
}

/// Canvas background: a color/gradient fill with an optional image overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    /// Solid color or CSS gradient
    pub fill_value: String,
    pub fill_opacity: f64,
    /// Image data-URI, empty when there is no overlay
    pub image_value: String,
    pub image_opacity: f64,
    /// Degrees
    pub image_rotation: f64,
    pub image_scale: f64,
    /// Percent of canvas width
    pub image_offset_x: f64,
    /// Percent of canvas height
    pub image_offset_y: f64,
}

impl Background {
    pub fn has_image(&self) -> bool {
        !self.image_value.is_empty()
    }
}

impl Default for Background {
    fn default() -> Self {
        Self {
            fill_value: "#ffffff".to_string(),
            fill_opacity: 1.0,
            image_value: String::new(),
            image_opacity: 1.0,
            image_rotation: 0.0,
            image_scale: 1.0,
            image_offset_x: 0.0,
            image_offset_y: 0.0,
        }
    }
}

/// Fields shared by every element variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBase {
    pub id: ElementId,
    /// Percent of canvas width
    pub x: f64,
    /// Percent of canvas height
    pub y: f64,
    pub rotation: f64,
    pub scale: f64,
    /// Informational only; paint order is the position in `Document::elements`
    pub z_index: i64,
    pub opacity: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementBase {
    fn fresh(x: f64, y: f64, z_index: i64, width: f64, height: f64) -> Self {
        Self {
            id: ElementId::new(),
            x,
            y,
            rotation: 0.0,
            scale: 1.0,
            z_index,
            opacity: 1.0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Primitive shape kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rect,
    Circle,
    Line,
    Triangle,
    Star,
}

impl ShapeType {
    pub const ALL: [ShapeType; 5] = [
        ShapeType::Rect,
        ShapeType::Circle,
        ShapeType::Line,
        ShapeType::Triangle,
        ShapeType::Star,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeType::Rect => "rect",
            ShapeType::Circle => "circle",
            ShapeType::Line => "line",
            ShapeType::Triangle => "triangle",
            ShapeType::Star => "star",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl FromStr for ShapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown shape type '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub content: String,
    pub font_size: f64,
    pub color: String,
    pub font_family: String,
    pub font_weight: String,
    pub font_style: FontStyle,
    pub letter_spacing: f64,
    pub line_height: f64,
    pub text_align: TextAlign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow: Option<String>,
    pub stroke_width: f64,
    pub stroke_color: String,
    pub padding: f64,
    pub padding_color: String,
    pub border_radius: f64,
}

impl TextElement {
    /// A new text block as created from the text panel
    pub fn fresh(z_index: i64) -> Self {
        Self {
            base: ElementBase::fresh(20.0, 20.0, z_index, 400.0, 120.0),
            content: "NEW TEXT".to_string(),
            font_size: 40.0,
            color: "#000000".to_string(),
            font_family: default_font().value.to_string(),
            font_weight: DEFAULT_FONT_WEIGHT.to_string(),
            font_style: FontStyle::Normal,
            letter_spacing: 1.0,
            line_height: 1.0,
            text_align: TextAlign::Center,
            text_shadow: None,
            stroke_width: 0.0,
            stroke_color: "#000000".to_string(),
            padding: 10.0,
            padding_color: "transparent".to_string(),
            border_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    #[serde(flatten)]
    pub base: ElementBase,
    /// Image data-URI
    pub src: String,
    pub border_radius: f64,
}

impl ImageElement {
    pub fn fresh(src: impl Into<String>, z_index: i64) -> Self {
        let mut base = ElementBase::fresh(20.0, 20.0, z_index, 400.0, 400.0);
        base.scale = 0.5;
        Self {
            base,
            src: src.into(),
            border_radius: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub shape_type: ShapeType,
    pub fill: String,
    pub stroke_width: f64,
    pub stroke_color: String,
}

impl ShapeElement {
    pub fn fresh(shape_type: ShapeType, z_index: i64) -> Self {
        let is_line = shape_type == ShapeType::Line;
        let (width, height) = if is_line { (300.0, 4.0) } else { (150.0, 150.0) };
        Self {
            base: ElementBase::fresh(25.0, 25.0, z_index, width, height),
            shape_type,
            fill: if is_line { "transparent" } else { "#000000" }.to_string(),
            stroke_width: 0.0,
            stroke_color: "#000000".to_string(),
        }
    }
}

/// One positioned object on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
    Shape(ShapeElement),
}

impl Element {
    pub fn base(&self) -> &ElementBase {
        match self {
            Element::Text(t) => &t.base,
            Element::Image(i) => &i.base,
            Element::Shape(s) => &s.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ElementBase {
        match self {
            Element::Text(t) => &mut t.base,
            Element::Image(i) => &mut i.base,
            Element::Shape(s) => &mut s.base,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.base().id
    }

    /// Wire tag of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Image(_) => "image",
            Element::Shape(_) => "shape",
        }
    }

    /// Short label for layer lists
    pub fn label(&self) -> String {
        match self {
            Element::Text(t) if !t.content.is_empty() => t.content.chars().take(15).collect(),
            Element::Text(_) => "TEXT".to_string(),
            Element::Image(_) => "IMAGE".to_string(),
            Element::Shape(s) => format!("SHAPE ({})", s.shape_type.as_str()),
        }
    }

    /// Copy with a new id, offset by (`dx`, `dy`) percent
    pub fn duplicated(&self, dx: f64, dy: f64) -> Self {
        let mut copy = self.clone();
        let base = copy.base_mut();
        base.id = ElementId::new();
        base.x += dx;
        base.y += dy;
        copy
    }
}

/// The single editable design project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub background: Background,
    /// Paint order: first is bottom, last is front
    pub elements: Vec<Element>,
    pub aspect_ratio: AspectRatio,
    /// Epoch milliseconds
    pub last_modified: i64,
}

impl Document {
    /// A blank document as shown at session start
    pub fn new() -> Self {
        Self {
            id: DocumentId::new(),
            name: UNTITLED_NAME.to_string(),
            background: Background {
                image_opacity: 0.8,
                ..Background::default()
            },
            elements: Vec::new(),
            aspect_ratio: AspectRatio::default(),
            last_modified: now_millis(),
        }
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|el| el.id() == id)
    }

    pub fn position_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|el| el.id() == id)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        // Serializing plain structs with string keys cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// A named, user-captured revision of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub name: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub data: Document,
    /// PNG data-URI preview, best effort
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}
