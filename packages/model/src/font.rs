//! Font-level attributes.

use glyphhub_changes::{impl_change_subject, ChangeResult, ChangeSubject, PathSegment, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::any::Any;

/// Glyph name → code points
pub type GlyphMap = IndexMap<String, Vec<u32>>;

pub type FontLib = Map<String, Value>;

pub const DEFAULT_UNITS_PER_EM: i64 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAxis {
    pub name: String,
    pub label: String,
    pub tag: String,
    pub min_value: f64,
    pub default_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub mapping: Vec<Vec<f64>>,
    #[serde(default)]
    pub hidden: bool,
}

impl_change_subject!(GlobalAxis {
    "name" => name,
    "label" => label,
    "tag" => tag,
    "minValue" => min_value,
    "defaultValue" => default_value,
    "maxValue" => max_value,
    "mapping" => mapping,
    "hidden" => hidden,
});

/// Axis that only takes the listed values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDiscreteAxis {
    pub name: String,
    pub label: String,
    pub tag: String,
    pub values: Vec<f64>,
    pub default_value: f64,
    #[serde(default)]
    pub mapping: Vec<Vec<f64>>,
    #[serde(default)]
    pub hidden: bool,
}

impl_change_subject!(GlobalDiscreteAxis {
    "name" => name,
    "label" => label,
    "tag" => tag,
    "values" => values,
    "defaultValue" => default_value,
    "mapping" => mapping,
    "hidden" => hidden,
});

/// A font axis, told apart by shape: discrete axes carry `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontAxis {
    Discrete(GlobalDiscreteAxis),
    Continuous(GlobalAxis),
}

impl FontAxis {
    pub fn name(&self) -> &str {
        match self {
            FontAxis::Discrete(axis) => &axis.name,
            FontAxis::Continuous(axis) => &axis.name,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ChangeSubject {
        match self {
            FontAxis::Discrete(axis) => axis,
            FontAxis::Continuous(axis) => axis,
        }
    }
}

impl ChangeSubject for FontAxis {
    fn child_mut(&mut self, segment: &PathSegment) -> ChangeResult<&mut dyn ChangeSubject> {
        self.inner_mut().child_mut(segment)
    }

    fn set_item(&mut self, key: &PathSegment, item: Value) -> ChangeResult<()> {
        self.inner_mut().set_item(key, item)
    }

    fn delete_item(&mut self, key: &PathSegment) -> ChangeResult<()> {
        self.inner_mut().delete_item(key)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        match self {
            FontAxis::Discrete(_) => "GlobalDiscreteAxis",
            FontAxis::Continuous(_) => "GlobalAxis",
        }
    }
}
