//! Font handler: client edits, subscriptions and dependency tracking
//!
//! This tests:
//! - glyphMap assignment through a final edit
//! - routing of live and final edits by subscription pattern
//! - glyph creation and deletion reaching the backend
//! - read-only handlers applying edits without writing
//! - failed changes leaving local data untouched
//! - edits reloading fragments that were dropped while they loaded

mod common;

use common::*;
use glyphhub_changes::{PathOrPattern, PathSegment};
use glyphhub_sync::{FontHandler, HandlerConfig, MemoryBackend, SyncError};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_glyph_map_assignment() {
    let log = EventLog::default();
    let (memory, handler) = font_fixture(&log).await;
    let proxy = RecordingProxy::new("client", &log);
    let connection = handler.use_connection(proxy.clone());

    let assign = change(json!({"p": ["glyphMap"], "f": "=", "a": ["C", [67]]}));
    handler
        .edit_final(&connection, &assign, &change(json!({})), "add C", true)
        .await
        .unwrap();

    assert_eq!(handler.get_glyph_map().await.unwrap()["C"], vec![67]);
    handler.finish_writing().await.unwrap();
    assert_eq!(memory.glyph_map()["C"], vec![67]);
    assert_eq!(*log.lock().unwrap(), vec!["write glyphMap"]);
    handler.close().await.unwrap();
}

#[tokio::test]
async fn test_subscription_routing() {
    let log = EventLog::default();
    let (_memory, handler) = font_fixture(&log).await;
    let editor = RecordingProxy::new("editor", &log);
    let viewer = RecordingProxy::new("viewer", &log);
    let editor_connection = handler.use_connection(editor.clone());
    let viewer_connection = handler.use_connection(viewer.clone());

    handler.subscribe_changes(&editor_connection, subscription(json!({"glyphs": null})), false);
    handler.subscribe_changes(
        &viewer_connection,
        PathOrPattern::Path(vec![PathSegment::from("glyphs"), PathSegment::from("A")]),
        false,
    );

    let edit_a = change(json!({
        "p": ["glyphs", "A", "layers", "regular", "glyph"], "f": "=", "a": ["xAdvance", 510]
    }));
    let edit_b = change(json!({
        "p": ["glyphs", "B", "layers", "regular", "glyph"], "f": "=", "a": ["xAdvance", 520]
    }));
    handler
        .edit_final(&editor_connection, &edit_a, &change(json!({})), "A", true)
        .await
        .unwrap();
    handler
        .edit_final(&editor_connection, &edit_b, &change(json!({})), "B", true)
        .await
        .unwrap();

    // The source never hears its own edits.
    assert!(editor.changes().is_empty());
    assert_eq!(viewer.changes(), vec![edit_a.clone()]);

    // Live edits only go to live subscriptions.
    handler.edit_incremental(&editor_connection, &edit_a).await;
    assert_eq!(viewer.changes().len(), 1);
    let glyph_a = json!({"glyphs": {"A": null}});
    handler.subscribe_changes(&viewer_connection, subscription(glyph_a.clone()), true);
    handler.edit_incremental(&editor_connection, &edit_a).await;
    assert_eq!(viewer.changes().len(), 2);

    handler.unsubscribe_changes(&viewer_connection, subscription(glyph_a), true);
    handler.edit_incremental(&editor_connection, &edit_a).await;
    assert_eq!(viewer.changes().len(), 2);

    // Final edits without broadcast stay local.
    handler
        .edit_final(&editor_connection, &edit_a, &change(json!({})), "A", false)
        .await
        .unwrap();
    assert_eq!(viewer.changes().len(), 2);

    drop(viewer_connection);
    handler
        .edit_final(&editor_connection, &edit_a, &change(json!({})), "A", true)
        .await
        .unwrap();
    assert_eq!(viewer.changes().len(), 2);
    handler.close().await.unwrap();
}

#[tokio::test]
async fn test_glyph_creation_and_deletion() {
    let log = EventLog::default();
    let (memory, handler) = font_fixture(&log).await;
    let connection = handler.use_connection(RecordingProxy::new("client", &log));

    let create = change(json!({"c": [
        {"p": ["glyphs"], "f": "=", "a": ["C", {
            "name": "C", "layers": {"regular": {"glyph": {"xAdvance": 600}}}
        }]},
        {"p": ["glyphMap"], "f": "=", "a": ["C", [0x43]]}
    ]}));
    handler
        .edit_final(&connection, &create, &change(json!({})), "new glyph", true)
        .await
        .unwrap();
    let created = handler.get_glyph("C").await.unwrap().unwrap();
    assert_eq!(x_advance(&created), Some(600.0));

    handler.finish_writing().await.unwrap();
    assert_eq!(memory.glyph("C").map(|glyph| glyph.name), Some("C".to_string()));
    assert_eq!(memory.glyph_map()["C"], vec![0x43]);

    let delete = change(json!({"p": ["glyphs"], "f": "d", "a": ["B"]}));
    handler
        .edit_final(&connection, &delete, &change(json!({})), "delete glyph", true)
        .await
        .unwrap();
    assert_eq!(handler.get_glyph("B").await.unwrap(), None);
    handler.finish_writing().await.unwrap();
    assert_eq!(memory.glyph("B"), None);
    assert!(log.lock().unwrap().contains(&"delete glyphs/B".to_string()));
    handler.close().await.unwrap();
}

#[tokio::test]
async fn test_units_per_em_assignment_at_root() {
    init_tracing();
    let memory = Arc::new(MemoryBackend::new());
    let handler = FontHandler::new(memory.clone(), HandlerConfig::default());
    handler.start_tasks().await;

    handler
        .update_local_data(&change(json!({"f": "=", "a": ["unitsPerEm", 2048]})), None)
        .await
        .unwrap();
    assert_eq!(handler.get_units_per_em().await.unwrap(), 2048);
    handler.close().await.unwrap();
    assert_eq!(memory.units_per_em(), 2048);
    assert_eq!(memory.write_log(), vec!["unitsPerEm"]);
}

#[tokio::test]
async fn test_read_only_backend_keeps_edits_local() {
    init_tracing();
    let memory = Arc::new(MemoryBackend::read_only());
    memory.insert_glyph(glyph("A", &[]), vec![0x41]);
    let handler = FontHandler::new(memory.clone(), HandlerConfig::default());
    handler.start_tasks().await;
    assert!(handler.is_read_only());

    let edit = change(json!({
        "p": ["glyphs", "A", "layers", "regular", "glyph"], "f": "=", "a": ["xAdvance", 480]
    }));
    handler.update_local_data(&edit, None).await.unwrap();
    assert_eq!(x_advance(&handler.get_glyph("A").await.unwrap().unwrap()), Some(480.0));

    handler.close().await.unwrap();
    assert!(memory.write_log().is_empty());
    assert_eq!(x_advance(&memory.glyph("A").unwrap()), Some(500.0));
}

#[tokio::test]
async fn test_failed_change_leaves_local_data_untouched() {
    let log = EventLog::default();
    let (_memory, handler) = font_fixture(&log).await;

    let edit = change(json!({"p": ["glyphs", "A", "layers"], "c": [
        {"p": ["regular", "glyph"], "f": "=", "a": ["xAdvance", 900]},
        {"p": ["bold", "glyph"], "f": "=", "a": ["xAdvance", 900]}
    ]}));
    let error = handler.update_local_data(&edit, None).await.unwrap_err();
    assert!(matches!(error, SyncError::Change(ref error) if error.is_navigation_error()));
    assert_eq!(x_advance(&handler.get_glyph("A").await.unwrap().unwrap()), Some(500.0));

    let error = handler
        .update_local_data(&change(json!({"p": ["kerning"], "f": "=", "a": ["A", 10]})), None)
        .await
        .unwrap_err();
    assert!(matches!(error, SyncError::UnknownRootKey(_)));

    handler.close().await.unwrap();
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dependencies_follow_loads_and_edits() {
    let log = EventLog::default();
    let (_memory, handler) = font_fixture(&log).await;

    handler.get_glyph("Aacute").await.unwrap();
    assert_eq!(handler.iter_glyph_made_of("Aacute"), vec!["A", "acute"]);
    assert_eq!(handler.iter_glyph_used_by("acute"), vec!["Aacute"]);

    let swap = change(json!({
        "p": ["glyphs", "Aacute", "layers", "regular", "glyph", "components", 1],
        "f": "=",
        "a": ["name", "B"]
    }));
    handler.update_local_data(&swap, None).await.unwrap();
    assert_eq!(handler.iter_glyph_made_of("Aacute"), vec!["A", "B"]);
    assert!(handler.iter_glyph_used_by("acute").is_empty());
    handler.close().await.unwrap();
}

#[tokio::test]
async fn test_cached_reads_hit_the_backend_once() {
    init_tracing();
    let memory = Arc::new(MemoryBackend::new());
    memory.insert_glyph(glyph("A", &[]), vec![0x41]);
    let handler = FontHandler::new(memory.clone(), HandlerConfig::default());

    let (first, second) = tokio::join!(handler.get_glyph("A"), handler.get_glyph("A"));
    assert_eq!(first.unwrap(), second.unwrap());
    handler.get_glyph("A").await.unwrap();
    assert_eq!(memory.read_log(), vec!["glyphs/A"]);
}

#[tokio::test]
async fn test_session_helpers() {
    let log = EventLog::default();
    let (_memory, handler) = font_fixture(&log).await;
    assert_eq!(handler.get_suggested_glyph_name(0x41), "A");
    assert_eq!(handler.get_suggested_glyph_name(0x354D), "uni354D");
    assert_eq!(handler.get_unicode_from_glyph_name("dollar"), Some(0x24));

    let clipboard = json!({"contours": [{
        "points": [{"x": 0, "y": 0}, {"x": 10, "y": 20}], "isClosed": false
    }]});
    let pasted = handler.parse_clipboard(&clipboard.to_string()).unwrap();
    assert_eq!(pasted.path.point_count(), 2);
    assert!(handler.parse_clipboard("not a glyph").is_none());
    handler.close().await.unwrap();
}

#[tokio::test]
async fn test_edit_reloads_fragments_dropped_while_loading() {
    init_tracing();
    let log = EventLog::default();
    let memory = Arc::new(MemoryBackend::new());
    memory.insert_glyph(glyph("A", &[]), vec![0x41]);
    let backend = GatedBackend::new(memory.clone());
    let handler = FontHandler::new(backend.clone(), HandlerConfig::default());
    handler.start_tasks().await;
    let connection = handler.use_connection(RecordingProxy::new("client", &log));

    handler.get_glyph("A").await.unwrap();
    let mut edited = glyph("A", &[]);
    edited.layers.get_mut("regular").unwrap().glyph.x_advance = Some(700.0);
    memory.insert_glyph(edited, vec![0x41]);

    let set_origin = change(json!({
        "p": ["glyphs", "A", "layers", "regular", "glyph"], "f": "=", "a": ["verticalOrigin", 50]
    }));
    let empty_rollback = change(json!({}));
    let editing =
        handler.edit_final(&connection, &set_origin, &empty_rollback, "set origin", false);
    let reloading = async {
        // The edit now waits on the glyph map with A already in hand.
        backend.entered.notified().await;
        handler.reload_data(&pattern(json!({"glyphs": {"A": null}}))).await;
        backend.open();
    };
    let (result, ()) = tokio::join!(editing, reloading);
    result.unwrap();

    handler.finish_writing().await.unwrap();
    let stored = memory.glyph("A").unwrap();
    assert_eq!(x_advance(&stored), Some(700.0));
    assert_eq!(stored.layers["regular"].glyph.vertical_origin, Some(50.0));
    handler.close().await.unwrap();
}
