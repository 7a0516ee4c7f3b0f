//! # Backend
//!
//! Durable storage behind a [`FontHandler`](crate::FontHandler). Reads are
//! required; writes default to [`BackendError::ReadOnly`] so read-only
//! backends only implement the getters.

use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use glyphhub_changes::{Change, Pattern};
use glyphhub_model::{FontAxis, FontLib, GlyphMap, VariableGlyph};
use serde::{Deserialize, Serialize};

/// An out-of-process edit reported by the backend.
///
/// `change` is applied to whatever is cached; `reload_pattern` names data
/// that must be dropped and re-fetched instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reload_pattern: Option<Pattern>,
}

impl ExternalChange {
    pub fn change(change: Change) -> Self {
        Self {
            change: Some(change),
            reload_pattern: None,
        }
    }

    pub fn reload(reload_pattern: Pattern) -> Self {
        Self {
            change: None,
            reload_pattern: Some(reload_pattern),
        }
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_glyph_map(&self) -> BackendResult<GlyphMap>;

    /// `None` when the backend has no glyph of that name.
    async fn get_glyph(&self, glyph_name: &str) -> BackendResult<Option<VariableGlyph>>;

    async fn get_global_axes(&self) -> BackendResult<Vec<FontAxis>>;

    async fn get_units_per_em(&self) -> BackendResult<i64>;

    async fn get_font_lib(&self) -> BackendResult<FontLib>;

    /// Store a glyph. `Ok(Some(message))` is a soft error: nothing was
    /// raised, but the glyph could not be saved as given.
    async fn put_glyph(
        &self,
        _glyph_name: &str,
        _glyph: VariableGlyph,
        _code_points: Vec<u32>,
    ) -> BackendResult<Option<String>> {
        Err(BackendError::ReadOnly)
    }

    async fn delete_glyph(&self, _glyph_name: &str) -> BackendResult<()> {
        Err(BackendError::ReadOnly)
    }

    async fn put_glyph_map(&self, _glyph_map: GlyphMap) -> BackendResult<()> {
        Err(BackendError::ReadOnly)
    }

    async fn put_global_axes(&self, _axes: Vec<FontAxis>) -> BackendResult<()> {
        Err(BackendError::ReadOnly)
    }

    async fn put_units_per_em(&self, _units_per_em: i64) -> BackendResult<()> {
        Err(BackendError::ReadOnly)
    }

    async fn put_font_lib(&self, _lib: FontLib) -> BackendResult<()> {
        Err(BackendError::ReadOnly)
    }

    fn is_writable(&self) -> bool {
        false
    }

    /// Stream of external edits. Called once; the stream is not restartable.
    async fn watch_external_changes(&self) -> Option<BoxStream<'static, ExternalChange>> {
        None
    }

    async fn close(&self) {}
}
