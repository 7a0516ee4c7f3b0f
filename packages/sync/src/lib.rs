//! # Glyphhub Sync
//!
//! Live-editing core shared by every client editing one font.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ FontHandler                                              │
//! │  - LocalCache (LRU, shared in-flight loads)              │
//! │  - subscriptions per connection (live / final patterns)  │
//! │  - write queue + writer task                             │
//! │  - component DependencyGraph                             │
//! └──────────────────────────────────────────────────────────┘
//!        ↑ edits / reads                 ↓ reads / writes
//!   ClientProxy (per connection)      Backend (MemoryBackend, ...)
//! ```
//!
//! Changes are applied with `glyphhub-changes` to a [`RootObject`]
//! holding just the fragments a change names; patterns route the change to
//! other clients afterwards.

mod backend;
mod cache;
mod clipboard;
mod config;
mod dependencies;
mod error;
mod font_handler;
mod glyph_names;
mod memory_backend;
mod proxy;
mod root;
mod writer;

pub use backend::{Backend, ExternalChange};
pub use cache::{
    CacheEntry, FontAttribute, Fragment, FragmentKey, LocalCache, SharedLoad, GLYPHS_KEY,
};
pub use clipboard::parse_clipboard;
pub use config::{HandlerConfig, DEFAULT_CACHE_SIZE, DEFAULT_CONFIG_NAME};
pub use dependencies::DependencyGraph;
pub use error::{BackendError, BackendResult, ProxyError, ProxyResult, SyncError, SyncResult};
pub use font_handler::{ConnectionGuard, FontHandler, SAVE_ERROR_TITLE, SAVE_FAILED_TITLE};
pub use glyph_names::{FallbackGlyphNames, GlyphNames};
pub use memory_backend::{MemoryBackend, WriteFailure};
pub use proxy::{ClientProxy, Connection, ConnectionId};
pub use root::{collect_fragment_keys, FragmentUpdate, GlyphSet, RootObject};
pub use writer::{PendingWrite, WriteAction, WriteQueue};
