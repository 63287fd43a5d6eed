//! Migration - normalizes arbitrary stored or imported JSON into the current
//! [`Document`] schema.
//!
//! There is no version field. Older shapes are recognised structurally:
//! - a snapshot wrapper (`{data: {...}}` without `elements`) is unwrapped
//! - a legacy background (`value` without `fillValue`) is translated
//! - every other field falls back to its default when absent or wrongly typed
//!
//! Normalization is total for object input and idempotent on its own output.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::fonts::{DEFAULT_FONT_WEIGHT, default_font};
use crate::ids::{DocumentId, ElementId, fresh_id};
use crate::model::{
    AspectRatio, Background, Document, Element, ElementBase, ImageElement, ShapeElement,
    TextElement, UNTITLED_NAME,
};

type Object = Map<String, Value>;

/// Parse `text` as JSON and normalize it.
pub fn normalize_str(text: &str) -> CoreResult<Document> {
    let value: Value = serde_json::from_str(text)?;
    normalize(&value)
}

/// Normalize any document-shaped value into a [`Document`].
///
/// Fails only when the root is not a JSON object.
pub fn normalize(input: &Value) -> CoreResult<Document> {
    let root = input
        .as_object()
        .ok_or_else(|| CoreError::invalid_input(format!("expected an object, found {}", type_name(input))))?;

    let source = unwrap_snapshot(root);

    let id = DocumentId(id_or_fresh(source));
    let name = match source.get("name") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => UNTITLED_NAME.to_string(),
    };
    let aspect_ratio = source
        .get("aspectRatio")
        .and_then(Value::as_str)
        .and_then(AspectRatio::parse)
        .unwrap_or_default();
    let last_modified = integer(source, "lastModified").unwrap_or(0);

    let background = match source.get("background") {
        Some(Value::Object(bg)) => migrate_background(bg),
        _ => Background::default(),
    };

    let elements = match source.get("elements") {
        Some(Value::Array(items)) => migrate_elements(items),
        _ => Vec::new(),
    };

    debug!(
        document = %id,
        elements = elements.len(),
        "Document normalized"
    );

    Ok(Document {
        id,
        name,
        background,
        elements,
        aspect_ratio,
        last_modified,
    })
}

/// Normalize a single element value. Returns `None` for values that are not
/// objects or carry an unknown `type`.
pub fn normalize_element(value: &Value) -> Option<Element> {
    let Some(obj) = value.as_object() else {
        warn!(found = type_name(value), "Dropping element that is not an object");
        return None;
    };

    let kind = obj.get("type").and_then(Value::as_str);
    let element = match kind {
        Some("text") => Element::Text(TextElement {
            base: migrate_base(obj, 400.0, 100.0),
            content: match obj.get("content") {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                _ => "TEXT".to_string(),
            },
            font_size: number_or(obj, "fontSize", 40.0),
            color: string_or(obj, "color", "#000000"),
            font_family: string_or(obj, "fontFamily", default_font().value),
            font_weight: font_weight(obj),
            font_style: enum_or_default(obj, "fontStyle"),
            letter_spacing: number_or(obj, "letterSpacing", 0.0),
            line_height: number_or(obj, "lineHeight", 1.0),
            text_align: enum_or_default(obj, "textAlign"),
            text_shadow: obj.get("textShadow").and_then(Value::as_str).map(str::to_string),
            stroke_width: number_or(obj, "strokeWidth", 0.0),
            stroke_color: string_or(obj, "strokeColor", "#000000"),
            padding: number_or(obj, "padding", 0.0),
            padding_color: string_or(obj, "paddingColor", "transparent"),
            border_radius: number_or(obj, "borderRadius", 0.0),
        }),
        Some("image") => Element::Image(ImageElement {
            base: migrate_base(obj, 300.0, 300.0),
            src: string_or(obj, "src", ""),
            border_radius: number_or(obj, "borderRadius", 0.0),
        }),
        Some("shape") => Element::Shape(ShapeElement {
            base: migrate_base(obj, 150.0, 150.0),
            shape_type: enum_or_default(obj, "shapeType"),
            fill: string_or(obj, "fill", "#000000"),
            stroke_width: number_or(obj, "strokeWidth", 0.0),
            stroke_color: string_or(obj, "strokeColor", "#000000"),
        }),
        other => {
            warn!(kind = ?other, "Dropping element with unknown type");
            return None;
        }
    };

    Some(element)
}

/// Normalize a background value, translating the legacy single-value shape.
/// Anything but an object gives the default background.
pub fn normalize_background(value: &Value) -> Background {
    match value.as_object() {
        Some(bg) => migrate_background(bg),
        None => Background::default(),
    }
}

/// Use `data` as the source when the root looks like a snapshot wrapper.
fn unwrap_snapshot(root: &Object) -> &Object {
    let has_elements = !matches!(root.get("elements"), None | Some(Value::Null));
    match root.get("data") {
        Some(Value::Object(data)) if !has_elements => {
            debug!("Unwrapping snapshot-shaped input");
            data
        }
        _ => root,
    }
}

/// A background written before the fill/image split: `{value, opacity, type?,
/// rotation?, scale?, offsetX?, offsetY?}`.
fn is_legacy_background(bg: &Object) -> bool {
    bg.contains_key("value") && !bg.contains_key("fillValue")
}

fn is_image_value(bg: &Object) -> bool {
    bg.get("type").and_then(Value::as_str) == Some("image")
        || bg
            .get("value")
            .and_then(Value::as_str)
            .is_some_and(|v| v.starts_with("data:image"))
}

fn translate_legacy_background(bg: &Object) -> Object {
    let is_image = is_image_value(bg);
    let value = bg.get("value").cloned().unwrap_or(Value::Null);
    let opacity = bg.get("opacity").cloned().unwrap_or(Value::Null);

    debug!(is_image, "Translating legacy background");

    let mut out = Object::new();
    if is_image {
        out.insert("fillValue".into(), Value::from("#ffffff"));
        out.insert("fillOpacity".into(), Value::from(1.0));
        out.insert("imageValue".into(), value);
        out.insert("imageOpacity".into(), opacity);
    } else {
        out.insert("fillValue".into(), value);
        out.insert("fillOpacity".into(), opacity);
        out.insert("imageValue".into(), Value::from(""));
        out.insert("imageOpacity".into(), Value::from(1.0));
    }
    for (legacy, current) in [
        ("rotation", "imageRotation"),
        ("scale", "imageScale"),
        ("offsetX", "imageOffsetX"),
        ("offsetY", "imageOffsetY"),
    ] {
        if let Some(v) = bg.get(legacy) {
            out.insert(current.into(), v.clone());
        }
    }
    out
}

fn migrate_background(bg: &Object) -> Background {
    let translated;
    let bg = if is_legacy_background(bg) {
        translated = translate_legacy_background(bg);
        &translated
    } else {
        bg
    };

    let defaults = Background::default();
    Background {
        fill_value: string_or(bg, "fillValue", &defaults.fill_value),
        fill_opacity: unit_interval(number_or(bg, "fillOpacity", defaults.fill_opacity)),
        image_value: string_or(bg, "imageValue", &defaults.image_value),
        image_opacity: unit_interval(number_or(bg, "imageOpacity", defaults.image_opacity)),
        image_rotation: number_or(bg, "imageRotation", defaults.image_rotation),
        image_scale: positive_scale(number_or(bg, "imageScale", defaults.image_scale)),
        image_offset_x: number_or(bg, "imageOffsetX", defaults.image_offset_x),
        image_offset_y: number_or(bg, "imageOffsetY", defaults.image_offset_y),
    }
}

fn migrate_elements(items: &[Value]) -> Vec<Element> {
    let mut seen: HashSet<ElementId> = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let Some(mut element) = normalize_element(item) else {
            continue;
        };
        if seen.contains(element.id()) {
            let fresh = ElementId::new();
            debug!(duplicate = %element.id(), replacement = %fresh, "Regenerating duplicate element id");
            element.base_mut().id = fresh;
        }
        seen.insert(element.id().clone());
        out.push(element);
    }
    out
}

fn migrate_base(obj: &Object, width: f64, height: f64) -> ElementBase {
    ElementBase {
        id: ElementId(id_or_fresh(obj)),
        x: number_or(obj, "x", 0.0),
        y: number_or(obj, "y", 0.0),
        rotation: number_or(obj, "rotation", 0.0),
        scale: positive_scale(number_or(obj, "scale", 1.0)),
        z_index: integer(obj, "zIndex").unwrap_or(0),
        opacity: unit_interval(number_or(obj, "opacity", 1.0)),
        width: number_or(obj, "width", width),
        height: number_or(obj, "height", height),
    }
}

/// Non-empty string ids are kept, numeric legacy ids are stringified.
fn id_or_fresh(obj: &Object) -> String {
    match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fresh_id(),
    }
}

/// Weights were once stored as numbers (`700`); they are strings now.
fn font_weight(obj: &Object) -> String {
    match obj.get("fontWeight") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => DEFAULT_FONT_WEIGHT.to_string(),
    }
}

fn number_or(obj: &Object, key: &str, default: f64) -> f64 {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(default)
}

fn integer(obj: &Object, key: &str) -> Option<i64> {
    let value = obj.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite())
            .map(|n| n.round() as i64)
    })
}

fn string_or(obj: &Object, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn enum_or_default<T: DeserializeOwned + Default>(obj: &Object, key: &str) -> T {
    obj.get(key)
        .and_then(|v| T::deserialize(v).ok())
        .unwrap_or_default()
}

fn unit_interval(n: f64) -> f64 {
    n.clamp(0.0, 1.0)
}

fn positive_scale(n: f64) -> f64 {
    if n > 0.0 { n } else { 1.0 }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FontStyle, ShapeType, TextAlign};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn rejects_non_object_roots() {
        for input in [json!(null), json!([]), json!(3), json!("doc"), json!(true)] {
            let err = normalize(&input).unwrap_err();
            assert!(matches!(err, CoreError::InvalidInput { .. }), "{input}");
        }
    }

    #[test]
    fn background_patch_values_are_clamped() {
        let bg = normalize_background(&json!({
            "fillValue": "#123456",
            "imageOpacity": 3.0,
            "imageScale": -2.0,
            "imageRotation": "45",
        }));
        assert_eq!(bg.fill_value, "#123456");
        assert_eq!(bg.image_opacity, 1.0);
        assert_eq!(bg.image_scale, 1.0);
        assert_eq!(bg.image_rotation, 0.0);
        assert_eq!(normalize_background(&json!("red")), Background::default());
    }

    #[test]
    fn rejects_unparseable_text() {
        assert!(matches!(normalize_str("{not json"), Err(CoreError::InvalidJson(_))));
        assert!(matches!(normalize_str("null"), Err(CoreError::InvalidInput { .. })));
    }

    #[test]
    fn empty_object_gets_structural_defaults() {
        let doc = normalize(&json!({})).unwrap();
        assert!(!doc.id.as_str().is_empty());
        assert_eq!(doc.name, UNTITLED_NAME);
        assert_eq!(doc.aspect_ratio, AspectRatio::Square);
        assert!(doc.elements.is_empty());
        assert_eq!(doc.background, Background::default());
        assert_eq!(doc.last_modified, 0);
    }

    #[test]
    fn non_array_elements_become_empty() {
        let doc = normalize(&json!({"elements": "not an array"})).unwrap();
        assert!(doc.elements.is_empty());
    }

    #[test]
    fn unknown_aspect_ratio_falls_back() {
        let doc = normalize(&json!({"aspectRatio": "3:2"})).unwrap();
        assert_eq!(doc.aspect_ratio, AspectRatio::Square);
        let doc = normalize(&json!({"aspectRatio": "9:16"})).unwrap();
        assert_eq!(doc.aspect_ratio, AspectRatio::Story);
    }

    #[test]
    fn unwraps_snapshot_wrapper() {
        let wrapped = json!({
            "id": "snap1",
            "name": "Revision 1",
            "timestamp": 1,
            "data": {"id": "doc1", "name": "Cover", "elements": []}
        });
        let doc = normalize(&wrapped).unwrap();
        assert_eq!(doc.id.as_str(), "doc1");
        assert_eq!(doc.name, "Cover");
    }

    #[test]
    fn document_with_elements_is_not_unwrapped() {
        let doc = normalize(&json!({
            "id": "outer",
            "elements": [],
            "data": {"id": "inner"}
        }))
        .unwrap();
        assert_eq!(doc.id.as_str(), "outer");
    }

    #[test]
    fn non_object_data_is_not_unwrapped() {
        let doc = normalize(&json!({"id": "outer", "data": "blob"})).unwrap();
        assert_eq!(doc.id.as_str(), "outer");
    }

    #[test]
    fn legacy_color_background() {
        let doc = normalize(&json!({"background": {"value": "#ff0000", "opacity": 0.5}})).unwrap();
        assert_eq!(doc.background.fill_value, "#ff0000");
        assert_eq!(doc.background.fill_opacity, 0.5);
        assert_eq!(doc.background.image_value, "");
        assert_eq!(doc.background.image_opacity, 1.0);
    }

    #[test]
    fn legacy_image_background() {
        let doc = normalize(&json!({
            "background": {"value": "data:image/png;base64,AAAA", "opacity": 0.5, "rotation": 45, "scale": 2, "offsetX": -10, "offsetY": 12}
        }))
        .unwrap();
        let bg = &doc.background;
        assert_eq!(bg.fill_value, "#ffffff");
        assert_eq!(bg.fill_opacity, 1.0);
        assert_eq!(bg.image_value, "data:image/png;base64,AAAA");
        assert_eq!(bg.image_opacity, 0.5);
        assert_eq!(bg.image_rotation, 45.0);
        assert_eq!(bg.image_scale, 2.0);
        assert_eq!(bg.image_offset_x, -10.0);
        assert_eq!(bg.image_offset_y, 12.0);
    }

    #[test]
    fn legacy_explicit_image_type() {
        let doc = normalize(&json!({"background": {"type": "image", "value": "https://x/y.png"}})).unwrap();
        assert_eq!(doc.background.fill_value, "#ffffff");
        assert_eq!(doc.background.image_value, "https://x/y.png");
        assert_eq!(doc.background.image_opacity, 1.0);
    }

    #[test]
    fn legacy_non_data_uri_path_is_treated_as_fill() {
        let doc = normalize(&json!({"background": {"value": "/img/bg.png"}})).unwrap();
        assert_eq!(doc.background.fill_value, "/img/bg.png");
        assert_eq!(doc.background.image_value, "");
    }

    #[test]
    fn current_background_is_completed_field_by_field() {
        let doc = normalize(&json!({"background": {"fillValue": "linear-gradient(45deg, #ff00ff, #00ffff)", "imageScale": 3}})).unwrap();
        let bg = &doc.background;
        assert_eq!(bg.fill_value, "linear-gradient(45deg, #ff00ff, #00ffff)");
        assert_eq!(bg.fill_opacity, 1.0);
        assert_eq!(bg.image_scale, 3.0);
        assert_eq!(bg.image_offset_y, 0.0);
    }

    #[test]
    fn background_with_both_value_and_fill_value_is_current() {
        let doc = normalize(&json!({"background": {"value": "#123456", "fillValue": "#abcdef"}})).unwrap();
        assert_eq!(doc.background.fill_value, "#abcdef");
    }

    #[test]
    fn out_of_range_background_values_are_repaired() {
        let doc = normalize(&json!({"background": {"fillOpacity": 4, "imageOpacity": -1, "imageScale": 0}})).unwrap();
        assert_eq!(doc.background.fill_opacity, 1.0);
        assert_eq!(doc.background.image_opacity, 0.0);
        assert_eq!(doc.background.image_scale, 1.0);
    }

    #[test]
    fn text_element_defaults() {
        let doc = normalize(&json!({"elements": [{"type": "text"}]})).unwrap();
        let Element::Text(t) = &doc.elements[0] else {
            panic!("expected text");
        };
        assert!(!t.base.id.as_str().is_empty());
        assert_eq!(t.content, "TEXT");
        assert_eq!(t.font_weight, "800");
        assert_eq!(t.font_family, default_font().value);
        assert_eq!(t.font_size, 40.0);
        assert_eq!(t.font_style, FontStyle::Normal);
        assert_eq!(t.text_align, TextAlign::Center);
        assert_eq!(t.padding_color, "transparent");
        assert_eq!((t.base.width, t.base.height), (400.0, 100.0));
        assert_eq!((t.base.opacity, t.base.scale), (1.0, 1.0));
    }

    #[test]
    fn present_fields_are_preserved() {
        let doc = normalize(&json!({"elements": [{
            "type": "text", "id": "t1", "content": "HELLO", "x": 12.5, "y": 40,
            "fontWeight": "400", "textAlign": "left", "fontStyle": "italic",
            "textShadow": "2px 2px #000", "zIndex": 7
        }]}))
        .unwrap();
        let Element::Text(t) = &doc.elements[0] else {
            panic!("expected text");
        };
        assert_eq!(t.base.id.as_str(), "t1");
        assert_eq!(t.content, "HELLO");
        assert_eq!((t.base.x, t.base.y), (12.5, 40.0));
        assert_eq!(t.font_weight, "400");
        assert_eq!(t.text_align, TextAlign::Left);
        assert_eq!(t.font_style, FontStyle::Italic);
        assert_eq!(t.text_shadow.as_deref(), Some("2px 2px #000"));
        assert_eq!(t.base.z_index, 7);
    }

    #[test]
    fn wrongly_typed_fields_are_replaced() {
        let doc = normalize(&json!({"elements": [{
            "type": "shape", "x": "left", "shapeType": "hexagon", "fill": 12, "opacity": "half"
        }]}))
        .unwrap();
        let Element::Shape(s) = &doc.elements[0] else {
            panic!("expected shape");
        };
        assert_eq!(s.base.x, 0.0);
        assert_eq!(s.shape_type, ShapeType::Rect);
        assert_eq!(s.fill, "#000000");
        assert_eq!(s.base.opacity, 1.0);
        assert_eq!((s.base.width, s.base.height), (150.0, 150.0));
    }

    #[test]
    fn legacy_numeric_weight_and_id_are_translated() {
        let doc = normalize(&json!({"elements": [{"type": "text", "id": 42, "fontWeight": 700}]})).unwrap();
        let Element::Text(t) = &doc.elements[0] else {
            panic!("expected text");
        };
        assert_eq!(t.base.id.as_str(), "42");
        assert_eq!(t.font_weight, "700");
    }

    #[test]
    fn image_element_defaults() {
        let doc = normalize(&json!({"elements": [{"type": "image", "src": "data:image/png;base64,AA"}]})).unwrap();
        let Element::Image(i) = &doc.elements[0] else {
            panic!("expected image");
        };
        assert_eq!((i.base.width, i.base.height), (300.0, 300.0));
        assert_eq!(i.border_radius, 0.0);
        assert_eq!(i.src, "data:image/png;base64,AA");
    }

    #[test]
    fn unknown_elements_are_dropped() {
        let doc = normalize(&json!({"elements": [
            {"type": "video"}, 7, {"content": "no type"}, {"type": "shape", "id": "s1"}
        ]}))
        .unwrap();
        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].id().as_str(), "s1");
    }

    #[test]
    fn duplicate_element_ids_are_regenerated() {
        let doc = normalize(&json!({"elements": [
            {"type": "shape", "id": "dup"}, {"type": "shape", "id": "dup"}
        ]}))
        .unwrap();
        assert_eq!(doc.elements[0].id().as_str(), "dup");
        assert_ne!(doc.elements[1].id().as_str(), "dup");
    }

    #[test]
    fn element_order_is_preserved() {
        let doc = normalize(&json!({"elements": [
            {"type": "shape", "id": "a"}, {"type": "text", "id": "b"}, {"type": "image", "id": "c"}
        ]}))
        .unwrap();
        let ids: Vec<_> = doc.elements.iter().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn import_scenario_legacy_root_background() {
        let doc = normalize_str(r##"{"background": {"value": "#00ff00"}}"##).unwrap();
        assert!(doc.elements.is_empty());
        assert_eq!(doc.background.fill_value, "#00ff00");
        assert_eq!(doc.background.fill_opacity, 1.0);
        assert!(!doc.id.as_str().is_empty());
    }

    #[test]
    fn normalize_output_is_a_fixed_point() {
        let first = normalize(&json!({
            "background": {"value": "data:image/png;base64,AA"},
            "elements": [{"type": "text"}, {"type": "shape", "shapeType": "star"}, {"type": "image"}]
        }))
        .unwrap();
        let second = normalize(&first.to_json_value()).unwrap();
        assert_eq!(first, second);
    }

    const KEYS: &[&str] = &[
        "id", "name", "elements", "background", "data", "aspectRatio", "lastModified",
        "value", "fillValue", "opacity", "type", "x", "scale", "content", "shapeType",
        "fontWeight", "textAlign", "zIndex", "imageScale", "rotation",
    ];

    const WORDS: &[&str] = &[
        "text", "image", "shape", "star", "16:9", "data:image/png;base64,AA", "", "#ff0000",
    ];

    fn arb_key() -> impl Strategy<Value = String> {
        prop::sample::select(KEYS).prop_map(str::to_string)
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            (-1.0e6f64..1.0e6).prop_map(Value::from),
            prop::sample::select(WORDS).prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::vec((arb_key(), inner), 0..6)
                    .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
            ]
        })
    }

    fn arb_object() -> impl Strategy<Value = Value> {
        prop::collection::vec((arb_key(), arb_json()), 0..8)
            .prop_map(|pairs| Value::Object(pairs.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn normalize_is_total_for_objects(input in arb_object()) {
            prop_assert!(normalize(&input).is_ok());
        }

        #[test]
        fn normalize_is_idempotent(input in arb_object()) {
            let once = normalize(&input).unwrap();
            let twice = normalize(&once.to_json_value()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn non_objects_are_rejected(input in arb_json().prop_filter("non-object", |v| !v.is_object())) {
            prop_assert!(normalize(&input).is_err());
        }
    }
}
