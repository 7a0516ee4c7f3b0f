//! Client connections and the push calls the handler makes on them.

use crate::error::ProxyResult;
use async_trait::async_trait;
use glyphhub_changes::{Change, Pattern};
use std::fmt;
use std::sync::Arc;

/// Push interface of one connected client.
#[async_trait]
pub trait ClientProxy: Send + Sync {
    /// A change made elsewhere that matches this client's subscriptions.
    async fn external_change(&self, change: &Change) -> ProxyResult<()>;

    /// Data the client should drop and fetch again.
    async fn reload_data(&self, reload_pattern: &Pattern) -> ProxyResult<()>;

    /// A message for the user, e.g. a reverted edit.
    async fn message_from_server(&self, title: &str, detail: &str) -> ProxyResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection-{}", self.0)
    }
}

#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub proxy: Arc<dyn ClientProxy>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}
