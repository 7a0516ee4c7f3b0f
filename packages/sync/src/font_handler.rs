//! # Font handler
//!
//! Owns the live state of one font shared by every connected client.
//!
//! ```text
//!  client edit ──▶ update_local_data ──▶ cache ──▶ write queue ──▶ writer task ──▶ Backend
//!                         │                                            │
//!                         └──▶ broadcast_change ──▶ other clients      └─ failure: notify + reload
//!
//!  Backend ──▶ external change watcher ──▶ filter to cached data ──▶ cache
//!                                      └──▶ broadcast / reload_data ──▶ clients
//! ```
//!
//! All shared maps live behind one mutex that is never held across an
//! `.await`. Fragments are loaded before the lock is taken, so a change is
//! applied in a single critical section.

use crate::backend::{Backend, ExternalChange};
use crate::cache::{CacheEntry, FontAttribute, Fragment, FragmentKey, LocalCache, GLYPHS_KEY};
use crate::clipboard;
use crate::config::HandlerConfig;
use crate::dependencies::DependencyGraph;
use crate::error::{BackendError, SyncError, SyncResult};
use crate::glyph_names::{FallbackGlyphNames, GlyphNames};
use crate::proxy::{ClientProxy, Connection, ConnectionId};
use crate::root::{collect_fragment_keys, FragmentUpdate, RootObject};
use crate::writer::{PendingWrite, WriteAction, WriteQueue};
use futures::future::{join_all, BoxFuture};
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use glyphhub_changes::{apply_change, Change, ChangeFunctions, PathOrPattern, Pattern};
use glyphhub_model::{
    font_change_functions, FontAxis, FontLib, GlyphMap, StaticGlyph, VariableGlyph,
};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Title of the message sent when a write raised an error.
pub const SAVE_ERROR_TITLE: &str = "The data could not be saved due to an error.";
/// Title of the message sent for soft errors and a failed write pipeline.
pub const SAVE_FAILED_TITLE: &str = "The data could not be saved.";

fn revert_detail(cause: &str) -> String {
    format!("The edit has been reverted.\n\n{}", cause)
}

/// A connected client and what it wants to hear about.
struct Subscriber {
    connection: Connection,
    live: Pattern,
    committed: Pattern,
}

impl Subscriber {
    fn pattern_mut(&mut self, want_live: bool) -> &mut Pattern {
        if want_live {
            &mut self.live
        } else {
            &mut self.committed
        }
    }
}

struct HandlerState {
    cache: LocalCache,
    dependencies: DependencyGraph,
    subscribers: IndexMap<ConnectionId, Subscriber>,
    writes: WriteQueue,
    /// Bumped whenever cached fragments are dropped for a reload.
    reload_epoch: u64,
}

#[derive(Default)]
struct Tasks {
    writer: Option<JoinHandle<()>>,
    watcher: Option<JoinHandle<()>>,
}

struct Inner {
    backend: Arc<dyn Backend>,
    read_only: bool,
    functions: ChangeFunctions,
    glyph_names: Box<dyn GlyphNames>,
    state: Mutex<HandlerState>,
    tasks: Mutex<Tasks>,
    write_signal: Notify,
    idle: watch::Sender<bool>,
    next_connection_id: AtomicU64,
}

/// Cheaply clonable handle to one font's shared state.
#[derive(Clone)]
pub struct FontHandler {
    inner: Arc<Inner>,
}

/// Registration of a connection; unregisters it when dropped.
pub struct ConnectionGuard {
    handler: FontHandler,
    connection: Connection,
}

impl ConnectionGuard {
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Deref for ConnectionGuard {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.connection
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.handler.state().subscribers.shift_remove(&self.connection.id);
        debug!(connection = %self.connection.id, "connection unregistered");
    }
}

fn component_names(glyph: &Option<VariableGlyph>) -> BTreeSet<String> {
    glyph.as_ref().map(VariableGlyph::component_names).unwrap_or_default()
}

fn unexpected_fragment(key: &FragmentKey) -> SyncError {
    SyncError::Backend(BackendError::Other(format!("unexpected fragment type for {}", key)))
}

/// Persist action for one updated fragment, `None` if nothing needs writing.
fn write_action(
    key: &FragmentKey,
    fragment: Fragment,
    update: FragmentUpdate,
    glyph_map: Option<&Fragment>,
) -> Option<WriteAction> {
    match (fragment, update) {
        (_, FragmentUpdate::Absent) => None,
        (Fragment::Glyph(_), FragmentUpdate::Deleted) => Some(WriteAction::DeleteGlyph {
            glyph_name: key.glyph_name()?.to_string(),
        }),
        (Fragment::Glyph(Some(glyph)), _) => {
            let glyph_name = key.glyph_name()?.to_string();
            let code_points = match glyph_map {
                Some(Fragment::GlyphMap(glyph_map)) => {
                    glyph_map.get(&glyph_name).cloned().unwrap_or_default()
                }
                _ => Vec::new(),
            };
            Some(WriteAction::PutGlyph {
                glyph_name,
                glyph,
                code_points,
            })
        }
        (Fragment::Glyph(None), _) => None,
        (Fragment::GlyphMap(glyph_map), _) => Some(WriteAction::PutGlyphMap(glyph_map)),
        (Fragment::Axes(axes), _) => Some(WriteAction::PutGlobalAxes(axes)),
        (Fragment::UnitsPerEm(units_per_em), _) => Some(WriteAction::PutUnitsPerEm(units_per_em)),
        (Fragment::Lib(lib), _) => Some(WriteAction::PutFontLib(lib)),
    }
}

impl FontHandler {
    pub fn new(backend: Arc<dyn Backend>, config: HandlerConfig) -> Self {
        Self::with_glyph_names(backend, config, Box::new(FallbackGlyphNames))
    }

    pub fn with_glyph_names(
        backend: Arc<dyn Backend>,
        config: HandlerConfig,
        glyph_names: Box<dyn GlyphNames>,
    ) -> Self {
        let read_only = config.read_only || !backend.is_writable();
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        let (idle, _) = watch::channel(true);

        Self {
            inner: Arc::new(Inner {
                backend,
                read_only,
                functions: font_change_functions(),
                glyph_names,
                state: Mutex::new(HandlerState {
                    cache: LocalCache::new(capacity),
                    dependencies: DependencyGraph::new(),
                    subscribers: IndexMap::new(),
                    writes: WriteQueue::default(),
                    reload_epoch: 0,
                }),
                tasks: Mutex::new(Tasks::default()),
                write_signal: Notify::new(),
                idle,
                next_connection_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read_only
    }

    fn state(&self) -> MutexGuard<'_, HandlerState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- Lifecycle ----

    /// Spawn the writer and, if the backend reports external changes, the
    /// watcher. Must be called from within a tokio runtime.
    pub async fn start_tasks(&self) {
        let external_changes = self.inner.backend.watch_external_changes().await;

        let mut tasks = self.tasks();
        if tasks.writer.is_none() {
            tasks.writer = Some(tokio::spawn(self.clone().process_writes()));
        }
        if let Some(stream) = external_changes {
            if tasks.watcher.is_none() {
                tasks.watcher = Some(tokio::spawn(self.clone().process_external_changes(stream)));
            }
        }
    }

    /// Wait until every scheduled write has been performed.
    pub async fn finish_writing(&self) -> SyncResult<()> {
        let mut idle = self.inner.idle.subscribe();
        loop {
            if *idle.borrow_and_update() {
                return self.pipeline_status();
            }
            if idle.changed().await.is_err() {
                return self.pipeline_status();
            }
        }
    }

    /// Stop watching, drain pending writes, then close the backend.
    pub async fn close(&self) -> SyncResult<()> {
        let (writer, watcher) = {
            let mut tasks = self.tasks();
            (tasks.writer.take(), tasks.watcher.take())
        };

        if let Some(watcher) = watcher {
            watcher.abort();
        }
        let result = match writer {
            Some(writer) => {
                let result = self.finish_writing().await;
                writer.abort();
                result
            }
            None => self.pipeline_status(),
        };
        self.inner.backend.close().await;
        result
    }

    fn pipeline_status(&self) -> SyncResult<()> {
        let failure = self.state().writes.failure().map(str::to_string);
        match failure {
            Some(reason) => Err(SyncError::WritePipelineFailed(reason)),
            None => Ok(()),
        }
    }

    /// Register a client. Keep the guard for as long as the client is
    /// connected.
    pub fn use_connection(&self, proxy: Arc<dyn ClientProxy>) -> ConnectionGuard {
        let id = ConnectionId(self.inner.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let connection = Connection { id, proxy };
        self.state().subscribers.insert(
            id,
            Subscriber {
                connection: connection.clone(),
                live: Pattern::new(),
                committed: Pattern::new(),
            },
        );
        debug!(connection = %id, "connection registered");
        ConnectionGuard {
            handler: self.clone(),
            connection,
        }
    }

    // ---- Reads ----

    pub async fn get_glyph(&self, glyph_name: &str) -> SyncResult<Option<VariableGlyph>> {
        let key = FragmentKey::glyph(glyph_name);
        match self.load_fragment(&key).await? {
            Fragment::Glyph(glyph) => Ok(glyph),
            _ => Err(unexpected_fragment(&key)),
        }
    }

    pub async fn get_glyph_map(&self) -> SyncResult<GlyphMap> {
        let key = FragmentKey::Attribute(FontAttribute::GlyphMap);
        match self.load_fragment(&key).await? {
            Fragment::GlyphMap(glyph_map) => Ok(glyph_map),
            _ => Err(unexpected_fragment(&key)),
        }
    }

    pub async fn get_global_axes(&self) -> SyncResult<Vec<FontAxis>> {
        let key = FragmentKey::Attribute(FontAttribute::Axes);
        match self.load_fragment(&key).await? {
            Fragment::Axes(axes) => Ok(axes),
            _ => Err(unexpected_fragment(&key)),
        }
    }

    pub async fn get_units_per_em(&self) -> SyncResult<i64> {
        let key = FragmentKey::Attribute(FontAttribute::UnitsPerEm);
        match self.load_fragment(&key).await? {
            Fragment::UnitsPerEm(units_per_em) => Ok(units_per_em),
            _ => Err(unexpected_fragment(&key)),
        }
    }

    pub async fn get_font_lib(&self) -> SyncResult<FontLib> {
        let key = FragmentKey::Attribute(FontAttribute::Lib);
        match self.load_fragment(&key).await? {
            Fragment::Lib(lib) => Ok(lib),
            _ => Err(unexpected_fragment(&key)),
        }
    }

    pub fn get_suggested_glyph_name(&self, code_point: u32) -> String {
        self.inner.glyph_names.suggested_glyph_name(code_point)
    }

    pub fn get_unicode_from_glyph_name(&self, glyph_name: &str) -> Option<u32> {
        self.inner.glyph_names.unicode_from_glyph_name(glyph_name)
    }

    pub fn parse_clipboard(&self, data: &str) -> Option<StaticGlyph> {
        clipboard::parse_clipboard(data)
    }

    /// Glyphs `glyph_name` is built from, transitively.
    pub fn iter_glyph_made_of(&self, glyph_name: &str) -> Vec<String> {
        self.state().dependencies.iter_made_of(glyph_name)
    }

    /// Glyphs that use `glyph_name`, transitively.
    pub fn iter_glyph_used_by(&self, glyph_name: &str) -> Vec<String> {
        self.state().dependencies.iter_used_by(glyph_name)
    }

    /// Return the cached fragment, or load it once from the backend no
    /// matter how many tasks ask for it concurrently.
    async fn load_fragment(&self, key: &FragmentKey) -> SyncResult<Fragment> {
        let load = {
            let mut state = self.state();
            let pending = match state.cache.get(key) {
                Some(CacheEntry::Ready(fragment)) => return Ok(fragment.clone()),
                Some(CacheEntry::Loading(load)) => Some(load.clone()),
                None => None,
            };
            match pending {
                Some(load) => load,
                None => {
                    debug!(%key, "loading from backend");
                    let load = self.fetch(key.clone()).shared();
                    state.cache.insert_loading(key.clone(), load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;

        {
            let mut state = self.state();
            // A reload may have dropped the entry meanwhile; then this result is stale.
            if state.cache.is_loading(key, &load) {
                match &result {
                    Ok(fragment) => {
                        if let (FragmentKey::Glyph(glyph_name), Fragment::Glyph(glyph)) =
                            (key, fragment)
                        {
                            state.dependencies.update(glyph_name, component_names(glyph));
                        }
                        state.cache.insert_ready(key.clone(), fragment.clone());
                    }
                    Err(_) => {
                        state.cache.remove(key);
                    }
                }
            }
        }

        Ok(result?)
    }

    fn fetch(&self, key: FragmentKey) -> BoxFuture<'static, Result<Fragment, BackendError>> {
        let backend = self.inner.backend.clone();
        async move {
            match key {
                FragmentKey::Glyph(glyph_name) => {
                    backend.get_glyph(&glyph_name).await.map(Fragment::Glyph)
                }
                FragmentKey::Attribute(FontAttribute::GlyphMap) => {
                    backend.get_glyph_map().await.map(Fragment::GlyphMap)
                }
                FragmentKey::Attribute(FontAttribute::Axes) => {
                    backend.get_global_axes().await.map(Fragment::Axes)
                }
                FragmentKey::Attribute(FontAttribute::UnitsPerEm) => {
                    backend.get_units_per_em().await.map(Fragment::UnitsPerEm)
                }
                FragmentKey::Attribute(FontAttribute::Lib) => {
                    backend.get_font_lib().await.map(Fragment::Lib)
                }
            }
        }
        .boxed()
    }

    // ---- Subscriptions ----

    pub fn subscribe_changes(
        &self,
        connection: &Connection,
        path_or_pattern: PathOrPattern,
        want_live: bool,
    ) {
        let pattern = path_or_pattern.into_pattern();
        match self.state().subscribers.get_mut(&connection.id) {
            Some(subscriber) => subscriber.pattern_mut(want_live).add_pattern(&pattern),
            None => warn!(connection = %connection.id, "subscribe from unregistered connection"),
        }
        debug!(connection = %connection.id, want_live, "subscribed to changes");
    }

    pub fn unsubscribe_changes(
        &self,
        connection: &Connection,
        path_or_pattern: PathOrPattern,
        want_live: bool,
    ) {
        let pattern = path_or_pattern.into_pattern();
        match self.state().subscribers.get_mut(&connection.id) {
            Some(subscriber) => subscriber.pattern_mut(want_live).remove_pattern(&pattern),
            None => warn!(connection = %connection.id, "unsubscribe from unregistered connection"),
        }
        debug!(connection = %connection.id, want_live, "unsubscribed from changes");
    }

    // ---- Edits ----

    /// A live, in-progress edit: forwarded to live subscribers only.
    pub async fn edit_incremental(&self, connection: &Connection, change: &Change) {
        self.broadcast_change(change, Some(connection.id), true).await;
    }

    /// A committed edit: applied locally, persisted and, when `broadcast` is
    /// set, forwarded to other subscribers. Clients keep the rollback change
    /// for their own undo stack.
    #[instrument(
        skip(self, connection, final_change, _rollback_change),
        fields(connection = %connection.id)
    )]
    pub async fn edit_final(
        &self,
        connection: &Connection,
        final_change: &Change,
        _rollback_change: &Change,
        edit_label: &str,
        broadcast: bool,
    ) -> SyncResult<()> {
        self.update_local_data(final_change, Some(connection)).await?;
        if broadcast {
            self.broadcast_change(final_change, Some(connection.id), false).await;
        }
        Ok(())
    }

    /// Apply `change` to the local data and schedule writes for every
    /// fragment it touched.
    pub async fn update_local_data(
        &self,
        change: &Change,
        origin: Option<&Connection>,
    ) -> SyncResult<()> {
        let keys = collect_fragment_keys(change)?;
        // Glyph writes carry their code points.
        let glyph_map_key = FragmentKey::Attribute(FontAttribute::GlyphMap);
        let needs_glyph_map =
            !self.inner.read_only && keys.iter().any(|key| key.glyph_name().is_some());

        let writes: Vec<(FragmentKey, WriteAction)> = loop {
            let epoch = self.state().reload_epoch;

            let mut loaded = Vec::with_capacity(keys.len());
            for key in &keys {
                loaded.push((key.clone(), self.load_fragment(key).await?));
            }
            let glyph_map = if needs_glyph_map {
                Some(self.load_fragment(&glyph_map_key).await?)
            } else {
                None
            };

            let applied = {
                let mut state = self.state();
                // Values loaded before a reload dropped them are stale.
                let stale = state.reload_epoch != epoch
                    && keys
                        .iter()
                        .chain(needs_glyph_map.then_some(&glyph_map_key))
                        .any(|key| !state.cache.is_ready(key));
                if stale {
                    None
                } else {
                    let updates = self.apply_to_cache(&mut state, change, loaded)?;
                    if self.inner.read_only {
                        Some(Vec::new())
                    } else {
                        let glyph_map =
                            state.cache.peek_ready(&glyph_map_key).or(glyph_map.as_ref());
                        Some(
                            updates
                                .into_iter()
                                .filter_map(|(key, fragment, update)| {
                                    write_action(&key, fragment, update, glyph_map)
                                        .map(|action| (key, action))
                                })
                                .collect(),
                        )
                    }
                }
            };

            match applied {
                Some(writes) => break writes,
                None => debug!("fragments were reloaded during the edit, loading again"),
            }
        };

        let mut result = Ok(());
        for (key, action) in writes {
            if let Err(error) = self.schedule_write(key, action, origin.cloned()).await {
                result = result.and(Err(error));
            }
        }
        result
    }

    /// Apply `change` to copies of `fragments` and store the results. The
    /// cache is left untouched when the change fails.
    fn apply_to_cache(
        &self,
        state: &mut HandlerState,
        change: &Change,
        fragments: Vec<(FragmentKey, Fragment)>,
    ) -> SyncResult<Vec<(FragmentKey, Fragment, FragmentUpdate)>> {
        let cache = &state.cache;
        let mut root = RootObject::new(fragments.into_iter().map(|(key, loaded)| {
            // Prefer what is cached now; an evicted entry falls back to the loaded value.
            let fragment = cache.peek_ready(&key).cloned().unwrap_or(loaded);
            (key, fragment)
        }));

        apply_change(&mut root, change, &self.inner.functions)?;

        let updates = root.into_updates();
        for (key, fragment, _) in &updates {
            if let (FragmentKey::Glyph(glyph_name), Fragment::Glyph(glyph)) = (key, fragment) {
                state.dependencies.update(glyph_name, component_names(glyph));
            }
            state.cache.insert_ready(key.clone(), fragment.clone());
        }
        Ok(updates)
    }

    /// Forward `change` to every connection but `source` whose subscription
    /// matches: the live pattern for live edits, either pattern otherwise.
    async fn broadcast_change(&self, change: &Change, source: Option<ConnectionId>, is_live: bool) {
        let targets: Vec<Connection> = {
            let state = self.state();
            state
                .subscribers
                .values()
                .filter(|subscriber| Some(subscriber.connection.id) != source)
                .filter(|subscriber| {
                    subscriber.live.matches(change)
                        || (!is_live && subscriber.committed.matches(change))
                })
                .map(|subscriber| subscriber.connection.clone())
                .collect()
        };
        if targets.is_empty() {
            return;
        }

        debug!(count = targets.len(), is_live, "broadcasting change");
        let pushes = targets
            .iter()
            .map(|connection| connection.proxy.external_change(change));
        let results = join_all(pushes).await;
        for (connection, result) in targets.iter().zip(results) {
            if let Err(error) = result {
                warn!(connection = %connection.id, "failed to push change: {}", error);
            }
        }
    }

    // ---- External changes ----

    async fn process_external_changes(self, mut stream: BoxStream<'static, ExternalChange>) {
        while let Some(external) = stream.next().await {
            if let Err(error) = self.handle_external_change(external).await {
                error!("exception in external changes watcher: {}", error);
            }
        }
        debug!("external change stream ended");
    }

    /// Apply an out-of-process edit to what is cached (nothing is written
    /// back), forward it, then process its reload request.
    ///
    /// A change that does not apply to the cached data still gets forwarded
    /// and its reload request processed; the error is returned afterwards.
    pub async fn handle_external_change(&self, external: ExternalChange) -> SyncResult<()> {
        let mut result = Ok(());
        if let Some(change) = &external.change {
            {
                let mut state = self.state();
                // Uncached data picks the edit up on its next load.
                let filtered = state.cache.local_data_pattern().filter_change(change, false);
                if let Some(filtered) = filtered {
                    result = self.apply_external_change(&mut state, &filtered);
                }
            }
            self.broadcast_change(change, None, false).await;
        }

        if let Some(reload_pattern) = &external.reload_pattern {
            self.reload_data(reload_pattern).await;
        }
        result
    }

    /// Apply an external change that was filtered down to cached fragments.
    /// On failure every fragment it names is dropped, so the next read
    /// fetches the backend's version.
    fn apply_external_change(&self, state: &mut HandlerState, filtered: &Change) -> SyncResult<()> {
        let keys = collect_fragment_keys(filtered)?;
        let fragments: Vec<(FragmentKey, Fragment)> = keys
            .iter()
            .filter_map(|key| {
                state
                    .cache
                    .peek_ready(key)
                    .cloned()
                    .map(|fragment| (key.clone(), fragment))
            })
            .collect();
        if let Err(error) = self.apply_to_cache(state, filtered, fragments) {
            for key in &keys {
                state.cache.remove(key);
            }
            state.reload_epoch += 1;
            return Err(error);
        }
        Ok(())
    }

    /// Drop everything `reload_pattern` names from the cache and ask each
    /// client to reload the part it is subscribed to.
    pub async fn reload_data(&self, reload_pattern: &Pattern) {
        let targets: Vec<(Connection, Pattern)> = {
            let mut state = self.state();
            state.reload_epoch += 1;
            for (root_key, node) in reload_pattern.iter() {
                if root_key == GLYPHS_KEY {
                    match node {
                        None => {
                            state.cache.remove_all_glyphs();
                        }
                        Some(glyphs) => {
                            for glyph_name in glyphs.top_level_keys() {
                                state.cache.remove(&FragmentKey::glyph(glyph_name));
                            }
                        }
                    }
                } else if let Some(attribute) = FontAttribute::from_key(root_key) {
                    state.cache.remove(&FragmentKey::Attribute(attribute));
                } else {
                    debug!("ignoring reload of unknown key {}", root_key);
                }
            }

            state
                .subscribers
                .values()
                .filter_map(|subscriber| {
                    let subscribed = subscriber.live.union(&subscriber.committed);
                    let pattern = reload_pattern.intersect(&subscribed);
                    (!pattern.is_empty()).then(|| (subscriber.connection.clone(), pattern))
                })
                .collect()
        };

        info!(count = targets.len(), "broadcasting reload request");
        let results = join_all(
            targets
                .iter()
                .map(|(connection, pattern)| connection.proxy.reload_data(pattern)),
        )
        .await;
        for ((connection, _), result) in targets.iter().zip(results) {
            if let Err(error) = result {
                warn!(connection = %connection.id, "failed to push reload request: {}", error);
            }
        }
    }

    // ---- Write pipeline ----

    async fn schedule_write(
        &self,
        key: FragmentKey,
        action: WriteAction,
        connection: Option<Connection>,
    ) -> SyncResult<()> {
        let scheduled = {
            let mut state = self.state();
            let scheduled = state.writes.schedule(key.clone(), PendingWrite { action, connection });
            if scheduled.is_ok() {
                self.inner.idle.send_replace(false);
            }
            scheduled
        };

        match scheduled {
            Ok(()) => {
                self.inner.write_signal.notify_one();
                Ok(())
            }
            Err((rejected, reason)) => {
                self.revert(&key, rejected.connection.as_ref(), SAVE_FAILED_TITLE, &reason).await;
                Err(SyncError::WritePipelineFailed(reason))
            }
        }
    }

    async fn process_writes(self) {
        loop {
            let next = {
                let mut state = self.state();
                if state.writes.failure().is_some() {
                    return;
                }
                let next = state.writes.pop_first();
                if next.is_none() {
                    self.inner.idle.send_replace(true);
                }
                next
            };

            match next {
                Some((key, write)) => {
                    if let Err(reason) = self.perform_write(key, write).await {
                        self.fail_pipeline(reason).await;
                        return;
                    }
                    tokio::task::yield_now().await;
                }
                None => self.inner.write_signal.notified().await,
            }
        }
    }

    /// Perform one write. `Err` means the pipeline cannot continue.
    async fn perform_write(&self, key: FragmentKey, write: PendingWrite) -> Result<(), String> {
        let PendingWrite { action, connection } = write;
        info!(%key, "{}", action);

        match action.perform(self.inner.backend.as_ref()).await {
            Ok(None) => Ok(()),
            Ok(Some(message)) => {
                warn!(%key, "soft error while writing: {}", message);
                self.revert(&key, connection.as_ref(), SAVE_FAILED_TITLE, &message).await;
                Ok(())
            }
            Err(error) => {
                error!(%key, "error while writing: {}", error);
                match connection {
                    Some(connection) => {
                        self.revert(&key, Some(&connection), SAVE_ERROR_TITLE, &error.to_string())
                            .await;
                        Ok(())
                    }
                    None => {
                        self.reload_data(&key.to_pattern()).await;
                        Err(SyncError::Persist {
                            key: key.to_string(),
                            message: error.to_string(),
                        }
                        .to_string())
                    }
                }
            }
        }
    }

    /// Tell the originator, then throw the local edit away.
    async fn revert(
        &self,
        key: &FragmentKey,
        connection: Option<&Connection>,
        title: &str,
        cause: &str,
    ) {
        if let Some(connection) = connection {
            let detail = revert_detail(cause);
            if let Err(error) = connection.proxy.message_from_server(title, &detail).await {
                warn!(connection = %connection.id, "failed to send revert message: {}", error);
            }
        }
        self.reload_data(&key.to_pattern()).await;
        if let Err(error) = self.load_fragment(key).await {
            warn!(%key, "could not reload after failed write: {}", error);
        }
    }

    async fn fail_pipeline(&self, reason: String) {
        error!("write pipeline failed: {}", reason);
        let dropped = {
            let mut state = self.state();
            let dropped = state.writes.fail(reason.clone());
            self.inner.idle.send_replace(true);
            dropped
        };
        for (key, write) in dropped {
            self.revert(&key, write.connection.as_ref(), SAVE_FAILED_TITLE, &reason).await;
        }
    }
}
