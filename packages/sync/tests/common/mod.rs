//! Shared fixtures for the handler tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::BoxStream;
use glyphhub_changes::{Change, PathOrPattern, Pattern};
use glyphhub_model::{FontAxis, FontLib, GlyphMap, VariableGlyph};
use glyphhub_sync::{
    Backend, BackendResult, ClientProxy, ExternalChange, FontHandler, HandlerConfig, MemoryBackend,
    ProxyResult,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

/// Events from backends and clients, in the order they happened.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn change(value: Value) -> Change {
    serde_json::from_value(value).unwrap()
}

pub fn pattern(value: Value) -> Pattern {
    serde_json::from_value(value).unwrap()
}

pub fn subscription(value: Value) -> PathOrPattern {
    PathOrPattern::Pattern(pattern(value))
}

/// A glyph with one layer holding a triangle and the given components.
pub fn glyph(name: &str, components: &[&str]) -> VariableGlyph {
    let components: Vec<Value> = components.iter().map(|name| json!({"name": name})).collect();
    serde_json::from_value(json!({
        "name": name,
        "sources": [{"name": "Regular", "layerName": "regular"}],
        "layers": {
            "regular": {
                "glyph": {
                    "path": {
                        "coordinates": [0, 0, 250, 700, 500, 0],
                        "pointTypes": [0, 0, 0],
                        "contourInfo": [{"endPoint": 2, "isClosed": true}]
                    },
                    "components": components,
                    "xAdvance": 500
                }
            }
        }
    }))
    .unwrap()
}

pub fn x_advance(glyph: &VariableGlyph) -> Option<f64> {
    glyph.layers["regular"].glyph.x_advance
}

/// Poll `condition` until it holds, failing after a few seconds.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[derive(Default)]
pub struct RecordingProxy {
    name: String,
    log: EventLog,
    pub changes: Mutex<Vec<Change>>,
    pub reloads: Mutex<Vec<Pattern>>,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingProxy {
    pub fn new(name: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            ..Self::default()
        })
    }

    pub fn changes(&self) -> Vec<Change> {
        self.changes.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> Vec<Pattern> {
        self.reloads.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientProxy for RecordingProxy {
    async fn external_change(&self, change: &Change) -> ProxyResult<()> {
        self.log.lock().unwrap().push(format!("{} change", self.name));
        self.changes.lock().unwrap().push(change.clone());
        Ok(())
    }

    async fn reload_data(&self, reload_pattern: &Pattern) -> ProxyResult<()> {
        let encoded = serde_json::to_string(reload_pattern).unwrap();
        self.log
            .lock()
            .unwrap()
            .push(format!("{} reload {}", self.name, encoded));
        self.reloads.lock().unwrap().push(reload_pattern.clone());
        Ok(())
    }

    async fn message_from_server(&self, title: &str, detail: &str) -> ProxyResult<()> {
        self.log.lock().unwrap().push(format!("{} message {}", self.name, title));
        self.messages.lock().unwrap().push((title.to_string(), detail.to_string()));
        Ok(())
    }
}

/// Memory backend that also records its writes into a shared event log.
pub struct LoggingBackend {
    pub inner: Arc<MemoryBackend>,
    log: EventLog,
}

impl LoggingBackend {
    pub fn new(inner: Arc<MemoryBackend>, log: &EventLog) -> Arc<Self> {
        Arc::new(Self { inner, log: log.clone() })
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Backend for LoggingBackend {
    async fn get_glyph_map(&self) -> BackendResult<GlyphMap> {
        self.inner.get_glyph_map().await
    }

    async fn get_glyph(&self, glyph_name: &str) -> BackendResult<Option<VariableGlyph>> {
        self.inner.get_glyph(glyph_name).await
    }

    async fn get_global_axes(&self) -> BackendResult<Vec<FontAxis>> {
        self.inner.get_global_axes().await
    }

    async fn get_units_per_em(&self) -> BackendResult<i64> {
        self.inner.get_units_per_em().await
    }

    async fn get_font_lib(&self) -> BackendResult<FontLib> {
        self.inner.get_font_lib().await
    }

    async fn put_glyph(
        &self,
        glyph_name: &str,
        glyph: VariableGlyph,
        code_points: Vec<u32>,
    ) -> BackendResult<Option<String>> {
        self.record(format!("write glyphs/{}", glyph_name));
        self.inner.put_glyph(glyph_name, glyph, code_points).await
    }

    async fn delete_glyph(&self, glyph_name: &str) -> BackendResult<()> {
        self.record(format!("delete glyphs/{}", glyph_name));
        self.inner.delete_glyph(glyph_name).await
    }

    async fn put_glyph_map(&self, glyph_map: GlyphMap) -> BackendResult<()> {
        self.record("write glyphMap".to_string());
        self.inner.put_glyph_map(glyph_map).await
    }

    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    async fn watch_external_changes(&self) -> Option<BoxStream<'static, ExternalChange>> {
        self.inner.watch_external_changes().await
    }
}

/// Memory backend whose glyph map reads wait until [`GatedBackend::open`].
pub struct GatedBackend {
    pub inner: Arc<MemoryBackend>,
    /// Signalled when a glyph map read starts waiting.
    pub entered: Notify,
    gate: Semaphore,
}

impl GatedBackend {
    pub fn new(inner: Arc<MemoryBackend>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            entered: Notify::new(),
            gate: Semaphore::new(0),
        })
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn get_glyph_map(&self) -> BackendResult<GlyphMap> {
        self.entered.notify_one();
        // The permit goes back on drop, so the gate stays open.
        let _permit = self.gate.acquire().await;
        self.inner.get_glyph_map().await
    }

    async fn get_glyph(&self, glyph_name: &str) -> BackendResult<Option<VariableGlyph>> {
        self.inner.get_glyph(glyph_name).await
    }

    async fn get_global_axes(&self) -> BackendResult<Vec<FontAxis>> {
        self.inner.get_global_axes().await
    }

    async fn get_units_per_em(&self) -> BackendResult<i64> {
        self.inner.get_units_per_em().await
    }

    async fn get_font_lib(&self) -> BackendResult<FontLib> {
        self.inner.get_font_lib().await
    }

    async fn put_glyph(
        &self,
        glyph_name: &str,
        glyph: VariableGlyph,
        code_points: Vec<u32>,
    ) -> BackendResult<Option<String>> {
        self.inner.put_glyph(glyph_name, glyph, code_points).await
    }

    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }
}

/// Backend with glyphs A, B and Aacute (made of A and acute), plus a
/// started handler on top of it.
pub async fn font_fixture(log: &EventLog) -> (Arc<MemoryBackend>, FontHandler) {
    init_tracing();
    let memory = Arc::new(MemoryBackend::new());
    memory.insert_glyph(glyph("A", &[]), vec![0x41]);
    memory.insert_glyph(glyph("B", &[]), vec![0x42]);
    memory.insert_glyph(glyph("acute", &[]), vec![0xB4]);
    memory.insert_glyph(glyph("Aacute", &["A", "acute"]), vec![0xC1]);

    let backend = LoggingBackend::new(memory.clone(), log);
    let handler = FontHandler::new(backend, HandlerConfig::default());
    handler.start_tasks().await;
    (memory, handler)
}
