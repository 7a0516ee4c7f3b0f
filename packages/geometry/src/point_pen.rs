//! # Point pens
//!
//! A point pen receives an outline as a stream of calls:
//!
//! ```text
//! begin_path()
//!   add_point((x, y), Some(Line), false)
//!   add_point((x, y), None, false)          // off-curve
//!   add_point((x, y), Some(Curve), true)
//! end_path()
//! add_component("acute", [1, 0, 0, 1, 200, 500])
//! ```
//!
//! [`PackedPathPointPen`] collects such a stream into a [`PackedPath`] plus a
//! component list; [`PackedPath::draw_points`] replays a path through any pen.

use crate::packed_path::{ContourInfo, PackedPath, PointType};
use crate::transform::{Affine, Transformation};

/// Segment type of an on-curve point. Off-curve points have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    Move,
    Line,
    Curve,
    QCurve,
}

pub trait PointPen {
    fn begin_path(&mut self);

    fn add_point(&mut self, point: (f64, f64), segment_type: Option<SegmentType>, smooth: bool);

    fn end_path(&mut self);

    fn add_component(&mut self, glyph_name: &str, transformation: Affine);
}

type PenPoint = ((f64, f64), Option<SegmentType>, bool);

#[derive(Debug, Default)]
pub struct PackedPathPointPen {
    path: PackedPath,
    components: Vec<(String, Transformation)>,
    current_contour: Option<Vec<PenPoint>>,
}

impl PackedPathPointPen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &PackedPath {
        &self.path
    }

    pub fn components(&self) -> &[(String, Transformation)] {
        &self.components
    }

    pub fn into_parts(self) -> (PackedPath, Vec<(String, Transformation)>) {
        (self.path, self.components)
    }

    fn push_contour(&mut self, contour: Vec<PenPoint>) {
        let is_closed = contour[0].1 != Some(SegmentType::Move);
        let is_quad_blob = contour.iter().all(|(_, segment_type, _)| segment_type.is_none());

        let point_types = if is_quad_blob {
            vec![PointType::OffCurveQuad; contour.len()]
        } else {
            let mut point_types: Vec<PointType> = contour
                .iter()
                .map(|(_, segment_type, smooth)| match (segment_type, smooth) {
                    (None, _) => PointType::OffCurveCubic,
                    (Some(_), true) => PointType::OnCurveSmooth,
                    (Some(_), false) => PointType::OnCurve,
                })
                .collect();
            patch_quad_off_curves(&contour, &mut point_types, is_closed);
            point_types
        };

        for ((x, y), _, _) in &contour {
            self.path.coordinates.push(*x);
            self.path.coordinates.push(*y);
        }
        self.path.point_types.extend(point_types);
        self.path.contour_info.push(ContourInfo {
            end_point: self.path.point_types.len() - 1,
            is_closed,
        });
    }
}

/// Off-curve points leading up to a `QCurve` point are quadratic. Walk back
/// from each such point until an on-curve point; closed contours wrap around,
/// open ones stop at the first point.
fn patch_quad_off_curves(contour: &[PenPoint], point_types: &mut [PointType], is_closed: bool) {
    let len = contour.len();
    for (index, (_, segment_type, _)) in contour.iter().enumerate() {
        if *segment_type != Some(SegmentType::QCurve) {
            continue;
        }
        let steps = if is_closed { len - 1 } else { index };
        for step in 1..=steps {
            let previous = (index + len - step) % len;
            if point_types[previous] != PointType::OffCurveCubic {
                break;
            }
            point_types[previous] = PointType::OffCurveQuad;
        }
    }
}

impl PointPen for PackedPathPointPen {
    fn begin_path(&mut self) {
        self.current_contour = Some(Vec::new());
    }

    fn add_point(&mut self, point: (f64, f64), segment_type: Option<SegmentType>, smooth: bool) {
        self.current_contour
            .get_or_insert_with(Vec::new)
            .push((point, segment_type, smooth));
    }

    fn end_path(&mut self) {
        match self.current_contour.take() {
            Some(contour) if !contour.is_empty() => self.push_contour(contour),
            _ => {}
        }
    }

    fn add_component(&mut self, glyph_name: &str, transformation: Affine) {
        self.components
            .push((glyph_name.to_string(), Transformation::from_affine(transformation)));
    }
}
