use thiserror::Error;

/// Top-level engine error. Boundary-facing code (`main`, the config
/// watcher, the query API) converts into this; everything below keeps
/// using `anyhow::Result` the way the rest of the crate does.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Core(#[from] reach_core::error::CoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
