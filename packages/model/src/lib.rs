//! # Glyphhub Model
//!
//! The font data model, addressable by changes. Each struct carries a static
//! field table (via `impl_change_subject!`) mapping wire names to fields, so
//! a change path like `["layers", "bold", "glyph", "xAdvance"]` navigates
//! typed data and assignments deserialize into the slot's own type.

mod font;
mod glyph;

pub use font::{FontAxis, FontLib, GlobalAxis, GlobalDiscreteAxis, GlyphMap, DEFAULT_UNITS_PER_EM};
pub use glyph::{
    Component, CustomData, Layer, LocalAxis, Location, Source, StaticGlyph, VariableGlyph,
};
pub use glyphhub_geometry::{PackedPath, PointType, Transformation};

use glyphhub_changes::ChangeFunctions;

/// Change functions for font data: the generic container operations plus the
/// path functions.
pub fn font_change_functions() -> ChangeFunctions {
    glyphhub_geometry::path_change_functions()
}
