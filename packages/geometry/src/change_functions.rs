//! Path-specific change functions and change-subject wiring for packed paths.

use crate::packed_path::{ContourInfo, PackedContour, PackedPath, PointType};
use crate::path::Point;
use crate::PathError;
use glyphhub_changes::{
    count_argument, impl_change_subject, impl_leaf_subject, int_argument, number_argument,
    typed_argument, ChangeError, ChangeFunctions, ChangeResult, ChangeSubject, Value,
};

impl_change_subject!(PackedPath {
    "coordinates" => coordinates,
    "pointTypes" => point_types,
    "contourInfo" => contour_info,
});

impl_change_subject!(ContourInfo {
    "endPoint" => end_point,
    "isClosed" => is_closed,
});

impl_leaf_subject!(PointType);

pub const SET_POINT_POSITION: &str = "=xy";
pub const INSERT_CONTOUR: &str = "insertContour";
pub const DELETE_CONTOUR: &str = "deleteContour";
pub const INSERT_POINT: &str = "insertPoint";
pub const DELETE_POINT: &str = "deletePoint";

/// Register the path functions into an existing table.
pub fn register_path_functions(functions: &mut ChangeFunctions) {
    functions.register(SET_POINT_POSITION, set_point_position);
    functions.register(INSERT_CONTOUR, insert_contour);
    functions.register(DELETE_CONTOUR, delete_contour);
    functions.register(INSERT_POINT, insert_point);
    functions.register(DELETE_POINT, delete_point);
}

pub fn path_change_functions() -> ChangeFunctions {
    let mut functions = ChangeFunctions::new();
    register_path_functions(&mut functions);
    functions
}

fn packed_path<'a>(
    subject: &'a mut dyn ChangeSubject,
    function: &'static str,
) -> ChangeResult<&'a mut PackedPath> {
    let type_name = subject.type_name();
    subject
        .as_any_mut()
        .downcast_mut::<PackedPath>()
        .ok_or(ChangeError::Unsupported { function, type_name })
}

fn path_error(function: &str, error: PathError) -> ChangeError {
    ChangeError::function(function, error)
}

fn set_point_position(subject: &mut dyn ChangeSubject, arguments: &[Value]) -> ChangeResult<()> {
    let point_index = count_argument(SET_POINT_POSITION, arguments, 0)?;
    let x = number_argument(SET_POINT_POSITION, arguments, 1)?;
    let y = number_argument(SET_POINT_POSITION, arguments, 2)?;
    packed_path(subject, SET_POINT_POSITION)?
        .set_point_position(point_index, x, y)
        .map_err(|error| path_error(SET_POINT_POSITION, error))
}

fn insert_contour(subject: &mut dyn ChangeSubject, arguments: &[Value]) -> ChangeResult<()> {
    let contour_index = int_argument(INSERT_CONTOUR, arguments, 0)?;
    let contour: PackedContour = typed_argument(INSERT_CONTOUR, arguments, 1)?;
    packed_path(subject, INSERT_CONTOUR)?
        .insert_contour(contour_index, contour)
        .map_err(|error| path_error(INSERT_CONTOUR, error))
}

fn delete_contour(subject: &mut dyn ChangeSubject, arguments: &[Value]) -> ChangeResult<()> {
    let contour_index = int_argument(DELETE_CONTOUR, arguments, 0)?;
    packed_path(subject, DELETE_CONTOUR)?
        .delete_contour(contour_index)
        .map_err(|error| path_error(DELETE_CONTOUR, error))
}

fn insert_point(subject: &mut dyn ChangeSubject, arguments: &[Value]) -> ChangeResult<()> {
    let contour_index = int_argument(INSERT_POINT, arguments, 0)?;
    let contour_point_index = int_argument(INSERT_POINT, arguments, 1)?;
    let point: Point = typed_argument(INSERT_POINT, arguments, 2)?;
    packed_path(subject, INSERT_POINT)?
        .insert_point(contour_index, contour_point_index, &point)
        .map_err(|error| path_error(INSERT_POINT, error))
}

fn delete_point(subject: &mut dyn ChangeSubject, arguments: &[Value]) -> ChangeResult<()> {
    let contour_index = int_argument(DELETE_POINT, arguments, 0)?;
    let contour_point_index = int_argument(DELETE_POINT, arguments, 1)?;
    packed_path(subject, DELETE_POINT)?
        .delete_point(contour_index, contour_point_index)
        .map_err(|error| path_error(DELETE_POINT, error))
}
