//! Component transformations.

use glyphhub_changes::impl_change_subject;
use serde::{Deserialize, Serialize};

/// `[xx, xy, yx, yy, dx, dy]`
pub type Affine = [f64; 6];

/// Decomposed component transformation, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transformation {
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub t_center_x: f64,
    pub t_center_y: f64,
}

impl Default for Transformation {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            t_center_x: 0.0,
            t_center_y: 0.0,
        }
    }
}

impl_change_subject!(Transformation {
    "translateX" => translate_x,
    "translateY" => translate_y,
    "rotation" => rotation,
    "scaleX" => scale_x,
    "scaleY" => scale_y,
    "skewX" => skew_x,
    "skewY" => skew_y,
    "tCenterX" => t_center_x,
    "tCenterY" => t_center_y,
});

impl Transformation {
    pub fn from_affine(affine: Affine) -> Self {
        let [xx, xy, yx, yy, dx, dy] = affine;
        let decomposed = decompose_two_by_two(xx, xy, yx, yy);
        // -0.0 == 0.0, so this also normalizes the sign
        let rotation = if decomposed.rotation == 0.0 { 0.0 } else { decomposed.rotation };
        Self {
            translate_x: dx,
            translate_y: dy,
            rotation: rotation.to_degrees(),
            scale_x: decomposed.scale_x,
            scale_y: decomposed.scale_y,
            skew_x: (-decomposed.skew_x).to_degrees(),
            skew_y: decomposed.skew_y.to_degrees(),
            t_center_x: 0.0,
            t_center_y: 0.0,
        }
    }
}

/// Rotation, scale and skew of a 2×2 linear map, angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecomposedTwoByTwo {
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
}

/// QR-like decomposition. Branches on whichever column is non-zero; the
/// all-zero matrix decomposes to all zeros.
pub fn decompose_two_by_two(a: f64, b: f64, c: f64, d: f64) -> DecomposedTwoByTwo {
    let delta = a * d - b * c;

    if a != 0.0 || b != 0.0 {
        let r = (a * a + b * b).sqrt();
        let angle = (a / r).acos();
        DecomposedTwoByTwo {
            rotation: if b > 0.0 { angle } else { -angle },
            scale_x: r,
            scale_y: delta / r,
            skew_x: ((a * c + b * d) / (r * r)).atan(),
            skew_y: 0.0,
        }
    } else if c != 0.0 || d != 0.0 {
        let s = (c * c + d * d).sqrt();
        let angle = if d > 0.0 { (-c / s).acos() } else { -(c / s).acos() };
        DecomposedTwoByTwo {
            rotation: std::f64::consts::FRAC_PI_2 - angle,
            scale_x: delta / s,
            scale_y: s,
            skew_x: 0.0,
            skew_y: ((a * c + b * d) / (s * s)).atan(),
        }
    } else {
        DecomposedTwoByTwo::default()
    }
}
