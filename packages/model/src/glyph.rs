//! Glyph-level data: variable glyphs, their sources and layers, and the
//! static glyphs those layers hold.

use glyphhub_changes::impl_change_subject;
use glyphhub_geometry::{PackedPath, Transformation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Axis name → axis value
pub type Location = IndexMap<String, f64>;

pub type CustomData = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub transformation: Transformation,
    #[serde(default)]
    pub location: Location,
}

impl_change_subject!(Component {
    "name" => name,
    "transformation" => transformation,
    "location" => location,
});

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticGlyph {
    #[serde(default)]
    pub path: PackedPath,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_advance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_advance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_origin: Option<f64>,
}

impl_change_subject!(StaticGlyph {
    "path" => path,
    "components" => components,
    "xAdvance" => x_advance,
    "yAdvance" => y_advance,
    "verticalOrigin" => vertical_origin,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub name: String,
    pub layer_name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub custom_data: CustomData,
}

impl_change_subject!(Source {
    "name" => name,
    "layerName" => layer_name,
    "location" => location,
    "inactive" => inactive,
    "customData" => custom_data,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub glyph: StaticGlyph,
    #[serde(default)]
    pub custom_data: CustomData,
}

impl_change_subject!(Layer {
    "glyph" => glyph,
    "customData" => custom_data,
});

/// Glyph-local design axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAxis {
    pub name: String,
    pub min_value: f64,
    pub default_value: f64,
    pub max_value: f64,
}

impl_change_subject!(LocalAxis {
    "name" => name,
    "minValue" => min_value,
    "defaultValue" => default_value,
    "maxValue" => max_value,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableGlyph {
    pub name: String,
    #[serde(default)]
    pub axes: Vec<LocalAxis>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub layers: IndexMap<String, Layer>,
    #[serde(default)]
    pub custom_data: CustomData,
}

impl_change_subject!(VariableGlyph {
    "name" => name,
    "axes" => axes,
    "sources" => sources,
    "layers" => layers,
    "customData" => custom_data,
});

impl VariableGlyph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Names of all glyphs used as components in any layer.
    pub fn component_names(&self) -> BTreeSet<String> {
        self.layers
            .values()
            .flat_map(|layer| layer.glyph.components.iter())
            .map(|component| component.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_names_across_layers() {
        let glyph: VariableGlyph = serde_json::from_value(json!({
            "name": "Aacute",
            "sources": [{"name": "default", "layerName": "default"}],
            "layers": {
                "default": {"glyph": {"components": [{"name": "A"}, {"name": "acute"}]}},
                "bold": {"glyph": {"components": [{"name": "A"}, {"name": "acute.case"}]}}
            }
        }))
        .unwrap();
        let names: Vec<_> = glyph.component_names().into_iter().collect();
        assert_eq!(names, vec!["A", "acute", "acute.case"]);
    }

    #[test]
    fn test_static_glyph_wire_shape() {
        let glyph = StaticGlyph {
            x_advance: Some(500.0),
            ..StaticGlyph::default()
        };
        assert_eq!(
            serde_json::to_value(&glyph).unwrap(),
            json!({
                "path": {"coordinates": [], "pointTypes": [], "contourInfo": []},
                "components": [],
                "xAdvance": 500.0
            })
        );
    }
}
