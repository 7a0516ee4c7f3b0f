//! Unpacked outline form: one object per point, grouped by contour.

use crate::packed_path::{PackedPath, PointType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffCurveType {
    Cubic,
    Quad,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub point_type: Option<OffCurveType>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub smooth: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Point {
    pub fn on_curve(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            point_type: None,
            smooth: false,
        }
    }

    pub fn smooth(x: f64, y: f64) -> Self {
        Self {
            smooth: true,
            ..Self::on_curve(x, y)
        }
    }

    pub fn off_curve_cubic(x: f64, y: f64) -> Self {
        Self {
            point_type: Some(OffCurveType::Cubic),
            ..Self::on_curve(x, y)
        }
    }

    pub fn off_curve_quad(x: f64, y: f64) -> Self {
        Self {
            point_type: Some(OffCurveType::Quad),
            ..Self::on_curve(x, y)
        }
    }

    pub fn from_packed(x: f64, y: f64, point_type: PointType) -> Self {
        match point_type {
            PointType::OnCurve => Self::on_curve(x, y),
            PointType::OnCurveSmooth => Self::smooth(x, y),
            PointType::OffCurveCubic => Self::off_curve_cubic(x, y),
            PointType::OffCurveQuad => Self::off_curve_quad(x, y),
        }
    }

    /// An off-curve type wins over the smooth flag.
    pub fn packed_type(&self) -> PointType {
        match (self.point_type, self.smooth) {
            (Some(OffCurveType::Cubic), _) => PointType::OffCurveCubic,
            (Some(OffCurveType::Quad), _) => PointType::OffCurveQuad,
            (None, true) => PointType::OnCurveSmooth,
            (None, false) => PointType::OnCurve,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contour {
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default)]
    pub contours: Vec<Contour>,
}

impl Path {
    pub fn as_packed_path(&self) -> PackedPath {
        PackedPath::from_unpacked_contours(&self.contours)
    }
}

impl PackedPath {
    pub fn as_path(&self) -> Path {
        Path {
            contours: self.unpacked_contours(),
        }
    }
}
