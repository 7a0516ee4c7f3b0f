//! # Packed paths
//!
//! Array-packed outline storage. All contours share three parallel arrays:
//!
//! ```text
//! coordinates:  [x0, y0, x1, y1, x2, y2, x3, y3, x4, y4, ...]
//! pointTypes:   [ 0,      2,      2,      8,      0,     ...]
//! contourInfo:  [{endPoint: 3, isClosed: true}, {endPoint: 9, ...}]
//! ```
//!
//! A contour spans from the previous contour's `endPoint + 1` up to and
//! including its own `endPoint`; the last `endPoint + 1` equals the number of
//! points. Every structural edit keeps that invariant by shifting the end
//! points of the edited contour and all contours after it.

use crate::path::{Contour, Point};
use crate::point_pen::{PointPen, SegmentType};
use crate::{PathError, PathResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PointType {
    OnCurve = 0x00,
    OffCurveQuad = 0x01,
    OffCurveCubic = 0x02,
    OnCurveSmooth = 0x08,
}

impl PointType {
    pub fn is_on_curve(self) -> bool {
        matches!(self, PointType::OnCurve | PointType::OnCurveSmooth)
    }

    pub fn is_off_curve(self) -> bool {
        !self.is_on_curve()
    }

    /// Segment type of an on-curve point that follows a point of this type.
    fn following_segment_type(self) -> SegmentType {
        match self {
            PointType::OffCurveCubic => SegmentType::Curve,
            PointType::OffCurveQuad => SegmentType::QCurve,
            _ => SegmentType::Line,
        }
    }
}

impl TryFrom<u8> for PointType {
    type Error = PathError;

    fn try_from(value: u8) -> PathResult<Self> {
        match value {
            0x00 => Ok(PointType::OnCurve),
            0x01 => Ok(PointType::OffCurveQuad),
            0x02 => Ok(PointType::OffCurveCubic),
            0x08 => Ok(PointType::OnCurveSmooth),
            other => Err(PathError::InvalidPointType(other)),
        }
    }
}

impl From<PointType> for u8 {
    fn from(point_type: PointType) -> Self {
        point_type as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourInfo {
    pub end_point: usize,
    #[serde(default)]
    pub is_closed: bool,
}

/// One contour in packed form, as carried by `insertContour`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedContour {
    pub coordinates: Vec<f64>,
    pub point_types: Vec<PointType>,
    #[serde(default)]
    pub is_closed: bool,
}

impl PackedContour {
    pub fn from_unpacked(contour: &Contour) -> Self {
        let mut coordinates = Vec::with_capacity(contour.points.len() * 2);
        let mut point_types = Vec::with_capacity(contour.points.len());
        for point in &contour.points {
            coordinates.push(point.x);
            coordinates.push(point.y);
            point_types.push(point.packed_type());
        }
        Self {
            coordinates,
            point_types,
            is_closed: contour.is_closed,
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_types.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedPath {
    #[serde(default)]
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub point_types: Vec<PointType>,
    #[serde(default)]
    pub contour_info: Vec<ContourInfo>,
}

impl PackedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_unpacked_contours(contours: &[Contour]) -> Self {
        let mut path = PackedPath::new();
        for contour in contours {
            // Empty contours are dropped, as the point pen does.
            if contour.points.is_empty() {
                continue;
            }
            let packed = PackedContour::from_unpacked(contour);
            path.coordinates.extend(packed.coordinates);
            path.point_types.extend(packed.point_types);
            path.contour_info.push(ContourInfo {
                end_point: path.point_types.len() - 1,
                is_closed: packed.is_closed,
            });
        }
        path
    }

    pub fn unpacked_contours(&self) -> Vec<Contour> {
        let mut start = 0;
        self.contour_info
            .iter()
            .map(|info| {
                let end = info.end_point + 1;
                let points = (start..end).filter_map(|index| self.get_point(index)).collect();
                start = end;
                Contour {
                    points,
                    is_closed: info.is_closed,
                }
            })
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.point_types.len()
    }

    pub fn contour_count(&self) -> usize {
        self.contour_info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contour_info.is_empty()
    }

    /// Absolute index of the first point of a (normalized) contour index.
    pub fn contour_start_point(&self, contour_index: usize) -> usize {
        match contour_index {
            0 => 0,
            _ => self.contour_info[contour_index - 1].end_point + 1,
        }
    }

    pub fn get_point(&self, point_index: usize) -> Option<Point> {
        let point_type = *self.point_types.get(point_index)?;
        let x = *self.coordinates.get(point_index * 2)?;
        let y = *self.coordinates.get(point_index * 2 + 1)?;
        Some(Point::from_packed(x, y, point_type))
    }

    pub fn get_contour(&self, contour_index: i64) -> PathResult<PackedContour> {
        let contour_index = self.normalize_contour_index(contour_index, false)?;
        let start = self.contour_start_point(contour_index);
        let info = self.contour_info[contour_index];
        let end = info.end_point + 1;
        Ok(PackedContour {
            coordinates: self.coordinates[start * 2..end * 2].to_vec(),
            point_types: self.point_types[start..end].to_vec(),
            is_closed: info.is_closed,
        })
    }

    pub fn set_point_position(&mut self, point_index: usize, x: f64, y: f64) -> PathResult<()> {
        if point_index >= self.point_count() {
            return Err(PathError::PointIndexOutOfBounds(point_index));
        }
        self.coordinates[point_index * 2] = x;
        self.coordinates[point_index * 2 + 1] = y;
        Ok(())
    }

    pub fn delete_contour(&mut self, contour_index: i64) -> PathResult<()> {
        let contour_index = self.normalize_contour_index(contour_index, false)?;
        let start = self.contour_start_point(contour_index);
        let num_points = self.contour_info[contour_index].end_point + 1 - start;
        self.replace_points(start, num_points, Vec::new(), Vec::new());
        self.contour_info.remove(contour_index);
        self.move_end_points(contour_index, -(num_points as i64));
        Ok(())
    }

    pub fn insert_contour(&mut self, contour_index: i64, contour: PackedContour) -> PathResult<()> {
        let contour_index = self.normalize_contour_index(contour_index, true)?;
        let num_points = contour.point_count();
        if num_points == 0 {
            return Err(PathError::EmptyContour);
        }
        if contour.coordinates.len() != num_points * 2 {
            return Err(PathError::MismatchedContour {
                coordinates: contour.coordinates.len(),
                points: num_points,
            });
        }
        let start = self.contour_start_point(contour_index);
        self.replace_points(start, 0, contour.coordinates, contour.point_types);
        self.contour_info.insert(
            contour_index,
            ContourInfo {
                end_point: start + num_points - 1,
                is_closed: contour.is_closed,
            },
        );
        self.move_end_points(contour_index + 1, num_points as i64);
        Ok(())
    }

    pub fn delete_point(&mut self, contour_index: i64, contour_point_index: i64) -> PathResult<()> {
        let contour_index = self.normalize_contour_index(contour_index, false)?;
        let point_index = self.absolute_point_index(contour_index, contour_point_index, false)?;
        // A contour losing its last point goes away with it.
        if self.contour_start_point(contour_index) == self.contour_info[contour_index].end_point {
            self.replace_points(point_index, 1, Vec::new(), Vec::new());
            self.contour_info.remove(contour_index);
            self.move_end_points(contour_index, -1);
            return Ok(());
        }
        self.replace_points(point_index, 1, Vec::new(), Vec::new());
        self.move_end_points(contour_index, -1);
        Ok(())
    }

    pub fn insert_point(
        &mut self,
        contour_index: i64,
        contour_point_index: i64,
        point: &Point,
    ) -> PathResult<()> {
        let contour_index = self.normalize_contour_index(contour_index, false)?;
        let point_index = self.absolute_point_index(contour_index, contour_point_index, true)?;
        self.replace_points(point_index, 0, vec![point.x, point.y], vec![point.packed_type()]);
        self.move_end_points(contour_index, 1);
        Ok(())
    }

    /// Replay the path through a point pen.
    pub fn draw_points<P: PointPen + ?Sized>(&self, pen: &mut P) {
        let mut start = 0;
        for info in &self.contour_info {
            let end = info.end_point + 1;
            let point_types = &self.point_types[start..end];
            let coordinates = &self.coordinates[start * 2..end * 2];

            let mut segment_type = match point_types.last() {
                Some(last) if info.is_closed => last.following_segment_type(),
                _ => SegmentType::Move,
            };

            pen.begin_path();
            for (point, &point_type) in coordinates.chunks_exact(2).zip(point_types) {
                let (point_segment_type, smooth) = match point_type {
                    PointType::OnCurve => (Some(segment_type), false),
                    PointType::OnCurveSmooth => (Some(segment_type), true),
                    _ => (None, false),
                };
                pen.add_point((point[0], point[1]), point_segment_type, smooth);
                segment_type = point_type.following_segment_type();
            }
            pen.end_path();
            start = end;
        }
    }

    fn normalize_contour_index(&self, contour_index: i64, for_insert: bool) -> PathResult<usize> {
        let num_contours = self.contour_info.len() as i64;
        let resolved = if contour_index < 0 {
            contour_index + num_contours
        } else {
            contour_index
        };
        let bias = if for_insert { 1 } else { 0 };
        if resolved < 0 || resolved >= num_contours + bias {
            return Err(PathError::ContourIndexOutOfBounds(contour_index));
        }
        Ok(resolved as usize)
    }

    fn absolute_point_index(
        &self,
        contour_index: usize,
        contour_point_index: i64,
        for_insert: bool,
    ) -> PathResult<usize> {
        let start = self.contour_start_point(contour_index);
        let num_points = (self.contour_info[contour_index].end_point + 1 - start) as i64;
        let resolved = if contour_point_index < 0 {
            contour_point_index + num_points
        } else {
            contour_point_index
        };
        let bias = if for_insert { 1 } else { 0 };
        if resolved < 0 || resolved >= num_points + bias {
            return Err(PathError::ContourPointIndexOutOfBounds(contour_point_index));
        }
        Ok(start + resolved as usize)
    }

    fn replace_points(
        &mut self,
        start: usize,
        num_points: usize,
        coordinates: Vec<f64>,
        point_types: Vec<PointType>,
    ) {
        self.coordinates.splice(start * 2..(start + num_points) * 2, coordinates);
        self.point_types.splice(start..start + num_points, point_types);
    }

    fn move_end_points(&mut self, from_contour_index: usize, offset: i64) {
        for info in &mut self.contour_info[from_contour_index..] {
            info.end_point = (info.end_point as i64 + offset) as usize;
        }
    }
}
