//! Clipboard parsing for pasted outlines.
//!
//! Accepts a JSON static glyph (`{"path": {...}, "xAdvance": ...}`) or a JSON
//! unpacked path (`{"contours": [...]}`). Anything else yields `None`.

use glyphhub_geometry::Path;
use glyphhub_model::StaticGlyph;
use serde_json::Value;

const STATIC_GLYPH_KEYS: [&str; 5] =
    ["path", "components", "xAdvance", "yAdvance", "verticalOrigin"];

pub fn parse_clipboard(data: &str) -> Option<StaticGlyph> {
    let value: Value = serde_json::from_str(data.trim()).ok()?;
    let object = value.as_object()?;

    if object.contains_key("contours") {
        let path: Path = serde_json::from_value(value).ok()?;
        let path = path.as_packed_path();
        // Advance is the right edge of the control bounds, as for pasted SVG.
        let x_advance = path
            .coordinates
            .chunks_exact(2)
            .map(|point| point[0])
            .fold(None, |max: Option<f64>, x| Some(max.map_or(x, |max| max.max(x))));
        return Some(StaticGlyph {
            path,
            x_advance,
            ..StaticGlyph::default()
        });
    }

    if STATIC_GLYPH_KEYS.iter().any(|key| object.contains_key(*key)) {
        return serde_json::from_value(value).ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphhub_geometry::PointType;
    use serde_json::json;

    #[test]
    fn test_static_glyph_json() {
        let text = json!({
            "path": {
                "coordinates": [0, 0, 10, 10],
                "pointTypes": [0, 0],
                "contourInfo": [{"endPoint": 1, "isClosed": false}]
            },
            "xAdvance": 300
        })
        .to_string();
        let glyph = parse_clipboard(&text).unwrap();
        assert_eq!(glyph.x_advance, Some(300.0));
        assert_eq!(glyph.path.point_count(), 2);
    }

    #[test]
    fn test_unpacked_path_json() {
        let text = json!({"contours": [{"points": [
            {"x": 0, "y": 0},
            {"x": 50, "y": 100, "type": "quad"},
            {"x": 120, "y": 0}
        ], "isClosed": true}]})
        .to_string();
        let glyph = parse_clipboard(&text).unwrap();
        assert_eq!(
            glyph.path.point_types,
            vec![PointType::OnCurve, PointType::OffCurveQuad, PointType::OnCurve]
        );
        assert_eq!(glyph.x_advance, Some(120.0));
    }

    #[test]
    fn test_unrecognized_data() {
        assert_eq!(parse_clipboard("<svg width=\"10\"></svg>"), None);
        assert_eq!(parse_clipboard("[1, 2, 3]"), None);
        assert_eq!(parse_clipboard(r#"{"name": "A"}"#), None);
    }
}
