//! # Glyphhub Changes
//!
//! Generic tree-patch engine and pattern algebra.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Change: path + function + args + children   │
//! └─────────────────────────────────────────────┘
//!          ↓ apply_change            ↓ Pattern::matches / filter_change
//! ┌──────────────────────────┐  ┌───────────────────────────────┐
//! │ ChangeSubject tree       │  │ Pattern: interest sets         │
//! │  - JSON values, Vec, map │  │  - union / difference          │
//! │  - typed model structs   │  │  - intersect                   │
//! │  - registered functions  │  │  - match / filter / split      │
//! └──────────────────────────┘  └───────────────────────────────┘
//! ```
//!
//! The engine knows nothing about fonts. Domain layers implement
//! [`ChangeSubject`] for their types (usually through
//! [`impl_change_subject!`]) and register their own change functions in a
//! [`ChangeFunctions`] table.

mod apply;
mod change;
mod error;
mod pattern;
mod subject;

pub use apply::{
    apply_change, count_argument, int_argument, number_argument, typed_argument, ChangeFunction,
    ChangeFunctions, Operation,
};
pub use change::{collect_change_paths, Change, PathSegment};
pub use error::{ChangeError, ChangeResult};
pub use pattern::{PathOrPattern, Pattern, PatternNode};
pub use subject::{cast, resolve_index, ChangeSubject};

// Used by the exported macros.
pub use serde_json::Value;
