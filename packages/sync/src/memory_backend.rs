//! In-memory backend, used by tests and as a scratch store.

use crate::backend::{Backend, ExternalChange};
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use glyphhub_model::{FontAxis, FontLib, GlyphMap, VariableGlyph, DEFAULT_UNITS_PER_EM};
use indexmap::IndexMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const EXTERNAL_CHANGE_CAPACITY: usize = 64;

/// How the next glyph write should fail.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteFailure {
    /// `put_glyph` returns an error.
    Raise(BackendError),
    /// `put_glyph` succeeds but reports a message.
    Soft(String),
}

#[derive(Debug, Clone)]
struct MemoryFont {
    glyph_map: GlyphMap,
    glyphs: IndexMap<String, VariableGlyph>,
    axes: Vec<FontAxis>,
    units_per_em: i64,
    lib: FontLib,
}

impl Default for MemoryFont {
    fn default() -> Self {
        Self {
            glyph_map: GlyphMap::new(),
            glyphs: IndexMap::new(),
            axes: Vec::new(),
            units_per_em: DEFAULT_UNITS_PER_EM,
            lib: FontLib::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    write_failures: IndexMap<String, WriteFailure>,
    write_log: Vec<String>,
    read_log: Vec<String>,
}

pub struct MemoryBackend {
    font: Mutex<MemoryFont>,
    recorder: Mutex<Recorder>,
    writable: bool,
    external_sender: mpsc::Sender<ExternalChange>,
    external_receiver: Mutex<Option<mpsc::Receiver<ExternalChange>>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (external_sender, external_receiver) = mpsc::channel(EXTERNAL_CHANGE_CAPACITY);
        Self {
            font: Mutex::new(MemoryFont::default()),
            recorder: Mutex::new(Recorder::default()),
            writable: true,
            external_sender,
            external_receiver: Mutex::new(Some(external_receiver)),
        }
    }

    pub fn read_only() -> Self {
        Self {
            writable: false,
            ..Self::new()
        }
    }

    /// Store a glyph directly, bypassing the write log.
    pub fn insert_glyph(&self, glyph: VariableGlyph, code_points: Vec<u32>) {
        let mut font = lock(&self.font);
        font.glyph_map.insert(glyph.name.clone(), code_points);
        font.glyphs.insert(glyph.name.clone(), glyph);
    }

    pub fn glyph(&self, glyph_name: &str) -> Option<VariableGlyph> {
        lock(&self.font).glyphs.get(glyph_name).cloned()
    }

    pub fn glyph_map(&self) -> GlyphMap {
        lock(&self.font).glyph_map.clone()
    }

    pub fn set_axes(&self, axes: Vec<FontAxis>) {
        lock(&self.font).axes = axes;
    }

    pub fn units_per_em(&self) -> i64 {
        lock(&self.font).units_per_em
    }

    /// Make the next write of `glyph_name` fail once.
    pub fn fail_next_write(&self, glyph_name: impl Into<String>, failure: WriteFailure) {
        lock(&self.recorder).write_failures.insert(glyph_name.into(), failure);
    }

    /// Fragment keys written so far, in order.
    pub fn write_log(&self) -> Vec<String> {
        lock(&self.recorder).write_log.clone()
    }

    /// Fragment keys read so far, in order.
    pub fn read_log(&self) -> Vec<String> {
        lock(&self.recorder).read_log.clone()
    }

    /// Report an out-of-process edit to whoever watches this backend.
    pub async fn send_external_change(&self, change: ExternalChange) -> BackendResult<()> {
        self.external_sender
            .send(change)
            .await
            .map_err(|_| BackendError::Other("external change watcher is gone".to_string()))
    }

    fn record_read(&self, key: impl Into<String>) {
        lock(&self.recorder).read_log.push(key.into());
    }

    fn record_write(&self, key: impl Into<String>) -> BackendResult<()> {
        if !self.writable {
            return Err(BackendError::ReadOnly);
        }
        lock(&self.recorder).write_log.push(key.into());
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_glyph_map(&self) -> BackendResult<GlyphMap> {
        self.record_read("glyphMap");
        Ok(lock(&self.font).glyph_map.clone())
    }

    async fn get_glyph(&self, glyph_name: &str) -> BackendResult<Option<VariableGlyph>> {
        self.record_read(format!("glyphs/{}", glyph_name));
        Ok(lock(&self.font).glyphs.get(glyph_name).cloned())
    }

    async fn get_global_axes(&self) -> BackendResult<Vec<FontAxis>> {
        self.record_read("axes");
        Ok(lock(&self.font).axes.clone())
    }

    async fn get_units_per_em(&self) -> BackendResult<i64> {
        self.record_read("unitsPerEm");
        Ok(lock(&self.font).units_per_em)
    }

    async fn get_font_lib(&self) -> BackendResult<FontLib> {
        self.record_read("lib");
        Ok(lock(&self.font).lib.clone())
    }

    async fn put_glyph(
        &self,
        glyph_name: &str,
        glyph: VariableGlyph,
        code_points: Vec<u32>,
    ) -> BackendResult<Option<String>> {
        self.record_write(format!("glyphs/{}", glyph_name))?;
        let failure = lock(&self.recorder).write_failures.shift_remove(glyph_name);
        match failure {
            Some(WriteFailure::Raise(error)) => return Err(error),
            Some(WriteFailure::Soft(message)) => return Ok(Some(message)),
            None => {}
        }
        let mut font = lock(&self.font);
        font.glyph_map.insert(glyph_name.to_string(), code_points);
        font.glyphs.insert(glyph_name.to_string(), glyph);
        Ok(None)
    }

    async fn delete_glyph(&self, glyph_name: &str) -> BackendResult<()> {
        self.record_write(format!("glyphs/{}", glyph_name))?;
        let mut font = lock(&self.font);
        if font.glyphs.shift_remove(glyph_name).is_none() {
            return Err(BackendError::GlyphNotFound(glyph_name.to_string()));
        }
        font.glyph_map.shift_remove(glyph_name);
        Ok(())
    }

    async fn put_glyph_map(&self, glyph_map: GlyphMap) -> BackendResult<()> {
        self.record_write("glyphMap")?;
        lock(&self.font).glyph_map = glyph_map;
        Ok(())
    }

    async fn put_global_axes(&self, axes: Vec<FontAxis>) -> BackendResult<()> {
        self.record_write("axes")?;
        lock(&self.font).axes = axes;
        Ok(())
    }

    async fn put_units_per_em(&self, units_per_em: i64) -> BackendResult<()> {
        self.record_write("unitsPerEm")?;
        lock(&self.font).units_per_em = units_per_em;
        Ok(())
    }

    async fn put_font_lib(&self, lib: FontLib) -> BackendResult<()> {
        self.record_write("lib")?;
        lock(&self.font).lib = lib;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    async fn watch_external_changes(&self) -> Option<BoxStream<'static, ExternalChange>> {
        let receiver = lock(&self.external_receiver).take()?;
        Some(ReceiverStream::new(receiver).boxed())
    }
}
