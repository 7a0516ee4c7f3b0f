use thiserror::Error;

pub type PathResult<T> = Result<T, PathError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("contourIndex out of bounds: {0}")]
    ContourIndexOutOfBounds(i64),

    #[error("contourPointIndex out of bounds: {0}")]
    ContourPointIndexOutOfBounds(i64),

    #[error("pointIndex out of bounds: {0}")]
    PointIndexOutOfBounds(usize),

    #[error("invalid point type: {0}")]
    InvalidPointType(u8),

    #[error("contour has no points")]
    EmptyContour,

    #[error("contour has {coordinates} coordinates for {points} point types")]
    MismatchedContour { coordinates: usize, points: usize },
}
