//! # Write pipeline state
//!
//! ```text
//!   Running(empty) ──schedule──▶ Running(queued) ──drained──▶ Running(empty)
//!         │                            │
//!         └──────── raised error without originator ──▶ Failed(reason)
//! ```
//!
//! Writes are keyed by fragment: scheduling a write for a key that is still
//! queued replaces the queued action and keeps its place in line.

use crate::backend::Backend;
use crate::cache::FragmentKey;
use crate::error::BackendResult;
use crate::proxy::Connection;
use glyphhub_model::{FontAxis, FontLib, GlyphMap, VariableGlyph};
use indexmap::IndexMap;
use std::fmt;

/// Persist action over an owned copy of the fragment value.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteAction {
    PutGlyph {
        glyph_name: String,
        glyph: VariableGlyph,
        code_points: Vec<u32>,
    },
    DeleteGlyph {
        glyph_name: String,
    },
    PutGlyphMap(GlyphMap),
    PutGlobalAxes(Vec<FontAxis>),
    PutUnitsPerEm(i64),
    PutFontLib(FontLib),
}

impl WriteAction {
    /// Run the action. `Ok(Some(message))` is a soft error.
    pub async fn perform(self, backend: &dyn Backend) -> BackendResult<Option<String>> {
        match self {
            WriteAction::PutGlyph {
                glyph_name,
                glyph,
                code_points,
            } => backend.put_glyph(&glyph_name, glyph, code_points).await,
            WriteAction::DeleteGlyph { glyph_name } => {
                backend.delete_glyph(&glyph_name).await.map(|_| None)
            }
            WriteAction::PutGlyphMap(glyph_map) => {
                backend.put_glyph_map(glyph_map).await.map(|_| None)
            }
            WriteAction::PutGlobalAxes(axes) => backend.put_global_axes(axes).await.map(|_| None),
            WriteAction::PutUnitsPerEm(units_per_em) => {
                backend.put_units_per_em(units_per_em).await.map(|_| None)
            }
            WriteAction::PutFontLib(lib) => backend.put_font_lib(lib).await.map(|_| None),
        }
    }
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAction::PutGlyph { glyph_name, .. } => write!(f, "put glyph {}", glyph_name),
            WriteAction::DeleteGlyph { glyph_name } => write!(f, "delete glyph {}", glyph_name),
            WriteAction::PutGlyphMap(_) => write!(f, "put glyph map"),
            WriteAction::PutGlobalAxes(_) => write!(f, "put global axes"),
            WriteAction::PutUnitsPerEm(_) => write!(f, "put units per em"),
            WriteAction::PutFontLib(_) => write!(f, "put font lib"),
        }
    }
}

/// A queued write and the connection whose edit caused it.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub action: WriteAction,
    pub connection: Option<Connection>,
}

pub enum WriteQueue {
    Running(IndexMap<FragmentKey, PendingWrite>),
    Failed(String),
}

impl Default for WriteQueue {
    fn default() -> Self {
        WriteQueue::Running(IndexMap::new())
    }
}

impl WriteQueue {
    /// Queue a write, or hand it back with the failure reason once the
    /// pipeline is dead.
    pub fn schedule(
        &mut self,
        key: FragmentKey,
        write: PendingWrite,
    ) -> Result<(), (PendingWrite, String)> {
        match self {
            WriteQueue::Running(queue) => {
                queue.insert(key, write);
                Ok(())
            }
            WriteQueue::Failed(reason) => Err((write, reason.clone())),
        }
    }

    /// Oldest queued write. `None` when idle or failed.
    pub fn pop_first(&mut self) -> Option<(FragmentKey, PendingWrite)> {
        match self {
            WriteQueue::Running(queue) => queue.shift_remove_index(0),
            WriteQueue::Failed(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            WriteQueue::Running(queue) => queue.is_empty(),
            WriteQueue::Failed(_) => true,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            WriteQueue::Running(_) => None,
            WriteQueue::Failed(reason) => Some(reason),
        }
    }

    /// Stop accepting writes; returns whatever was still queued.
    pub fn fail(&mut self, reason: String) -> Vec<(FragmentKey, PendingWrite)> {
        match std::mem::replace(self, WriteQueue::Failed(reason)) {
            WriteQueue::Running(queue) => queue.into_iter().collect(),
            WriteQueue::Failed(_) => Vec::new(),
        }
    }
}
