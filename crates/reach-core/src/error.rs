use thiserror::Error;

/// Error kinds that cross the core/collaborator boundary. Anything more
/// specific (a rusqlite error, a YAML parse error) is wrapped into one of
/// these before it leaves the owning module — callers outside the engine
/// should never need to match on a storage-library error type directly.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config invalid: {0}")]
    ConfigInvalid(String),

    #[error("store open failed: {0}")]
    StoreOpenFailed(String),

    #[error("store write failed: {0}")]
    StoreWriteFailed(String),

    #[error("host {0} not found")]
    NotFound(String),
}
