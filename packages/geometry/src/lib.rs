//! # Glyphhub Geometry
//!
//! Packed outline storage and the point-pen protocol used to build and replay
//! it, plus the path change functions the change engine dispatches to.
//!
//! ```text
//! point pen calls ──PackedPathPointPen──▶ PackedPath ──draw_points──▶ point pen calls
//!                                            │   ▲
//!                          unpacked_contours │   │ from_unpacked_contours
//!                                            ▼   │
//!                                       Vec<Contour>
//! ```

mod change_functions;
mod error;
mod packed_path;
mod path;
mod point_pen;
mod transform;

pub use change_functions::{
    path_change_functions, register_path_functions, DELETE_CONTOUR, DELETE_POINT, INSERT_CONTOUR,
    INSERT_POINT, SET_POINT_POSITION,
};
pub use error::{PathError, PathResult};
pub use packed_path::{ContourInfo, PackedContour, PackedPath, PointType};
pub use path::{Contour, OffCurveType, Path, Point};
pub use point_pen::{PackedPathPointPen, PointPen, SegmentType};
pub use transform::{decompose_two_by_two, Affine, DecomposedTwoByTwo, Transformation};
