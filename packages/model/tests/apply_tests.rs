//! Changes applied to typed font data
//!
//! This tests:
//! - navigation through the field tables
//! - typed casting of assigned and inserted items
//! - path functions reached through glyph layers
//! - polymorphic axis assignment

use glyphhub_changes::{apply_change, Change, ChangeError};
use glyphhub_model::{font_change_functions, FontAxis, GlyphMap, PointType, VariableGlyph};
use serde_json::{json, Value};

fn change(value: Value) -> Change {
    serde_json::from_value(value).unwrap()
}

fn glyph() -> VariableGlyph {
    serde_json::from_value(json!({
        "name": "A",
        "sources": [{"name": "Regular", "layerName": "regular"}],
        "layers": {
            "regular": {
                "glyph": {
                    "path": {
                        "coordinates": [0, 0, 250, 700, 500, 0],
                        "pointTypes": [0, 0, 0],
                        "contourInfo": [{"endPoint": 2, "isClosed": true}]
                    },
                    "components": [{"name": "acute"}],
                    "xAdvance": 500
                }
            }
        }
    }))
    .unwrap()
}

#[test]
fn test_set_point_through_layers() {
    let mut glyph = glyph();
    apply_change(
        &mut glyph,
        &change(json!({
            "p": ["layers", "regular", "glyph", "path"], "f": "=xy", "a": [1, 260, 710]
        })),
        &font_change_functions(),
    )
    .unwrap();
    assert_eq!(&glyph.layers["regular"].glyph.path.coordinates[2..4], &[260.0, 710.0]);
}

#[test]
fn test_grouped_layer_edits() {
    let mut glyph = glyph();
    apply_change(
        &mut glyph,
        &change(json!({"p": ["layers", "regular", "glyph"], "c": [
            {"f": "=", "a": ["xAdvance", 520]},
            {"p": ["components", 0, "transformation"], "f": "=", "a": ["translateX", 120]},
            {"p": ["path"], "f": "insertPoint", "a": [0, 3, {"x": 250, "y": -20, "type": "quad"}]}
        ]})),
        &font_change_functions(),
    )
    .unwrap();

    let static_glyph = &glyph.layers["regular"].glyph;
    assert_eq!(static_glyph.x_advance, Some(520.0));
    assert_eq!(static_glyph.components[0].transformation.translate_x, 120.0);
    assert_eq!(static_glyph.path.point_types[3], PointType::OffCurveQuad);
    assert_eq!(static_glyph.path.contour_info[0].end_point, 3);
}

#[test]
fn test_insert_items_are_cast() {
    let mut glyph = glyph();
    apply_change(
        &mut glyph,
        &change(json!({"p": ["sources"], "f": "+", "a": [1, {
            "name": "Bold", "layerName": "bold", "location": {"weight": 700}
        }]})),
        &font_change_functions(),
    )
    .unwrap();
    assert_eq!(glyph.sources[1].layer_name, "bold");
    assert_eq!(glyph.sources[1].location["weight"], 700.0);

    let error = apply_change(
        &mut glyph,
        &change(json!({"p": ["sources"], "f": "+", "a": [0, {"title": "no name"}]})),
        &font_change_functions(),
    )
    .unwrap_err();
    assert!(matches!(error, ChangeError::Cast(_)));
    assert_eq!(glyph.sources.len(), 2);
}

#[test]
fn test_new_layer_is_cast_into_map() {
    let mut glyph = glyph();
    apply_change(
        &mut glyph,
        &change(json!({"p": ["layers"], "f": "=", "a": ["bold", {"glyph": {"xAdvance": 560}}]})),
        &font_change_functions(),
    )
    .unwrap();
    assert_eq!(glyph.layers["bold"].glyph.x_advance, Some(560.0));

    apply_change(
        &mut glyph,
        &change(json!({"p": ["layers"], "f": "d", "a": ["bold"]})),
        &font_change_functions(),
    )
    .unwrap();
    assert!(!glyph.layers.contains_key("bold"));
}

#[test]
fn test_unknown_field_is_a_navigation_error() {
    let mut glyph = glyph();
    let error = apply_change(
        &mut glyph,
        &change(json!({"p": ["layers", "regular", "outline"], "f": "=", "a": ["x", 1]})),
        &font_change_functions(),
    )
    .unwrap_err();
    assert!(error.is_navigation_error());

    let error = apply_change(
        &mut glyph,
        &change(json!({"p": ["layers", "missing"], "f": "=", "a": ["glyph", {}]})),
        &font_change_functions(),
    )
    .unwrap_err();
    assert!(matches!(error, ChangeError::KeyNotFound { .. }));
}

#[test]
fn test_glyph_map_assignment() {
    let mut glyph_map = GlyphMap::new();
    apply_change(
        &mut glyph_map,
        &change(json!({"f": "=", "a": ["A", [0x41]]})),
        &font_change_functions(),
    )
    .unwrap();
    assert_eq!(glyph_map["A"], vec![0x41]);
}

#[test]
fn test_axis_assignment_selects_variant() {
    let mut axes: Vec<FontAxis> = Vec::new();
    apply_change(
        &mut axes,
        &change(json!({"f": "+", "a": [0,
            {"name": "weight", "label": "Weight", "tag": "wght",
             "minValue": 100, "defaultValue": 400, "maxValue": 900},
            {"name": "italic", "label": "Italic", "tag": "ital",
             "values": [0, 1], "defaultValue": 0}
        ]})),
        &font_change_functions(),
    )
    .unwrap();
    assert!(matches!(axes[0], FontAxis::Continuous(_)));
    assert!(matches!(axes[1], FontAxis::Discrete(_)));

    apply_change(
        &mut axes,
        &change(json!({"p": [0], "f": "=", "a": ["maxValue", 1000]})),
        &font_change_functions(),
    )
    .unwrap();
    match &axes[0] {
        FontAxis::Continuous(axis) => assert_eq!(axis.max_value, 1000.0),
        other => panic!("unexpected axis {:?}", other),
    }
}
