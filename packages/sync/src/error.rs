use glyphhub_changes::ChangeError;
use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;
pub type SyncResult<T> = Result<T, SyncError>;
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors raised by a storage backend.
///
/// Clonable because one load result is shared by every task waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Backend is read-only")]
    ReadOnly,

    #[error("Glyph not found: {0}")]
    GlyphNotFound(String),

    #[error("Backend I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Change(#[from] ChangeError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Unknown root key: {0}")]
    UnknownRootKey(String),

    #[error("Write pipeline failed: {0}")]
    WritePipelineFailed(String),

    #[error("Could not persist {key}: {message}")]
    Persist { key: String, message: String },
}

/// Errors pushing data to a connected client.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Connection closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}
