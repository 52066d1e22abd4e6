// File: src/error.rs
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImeError {
    /// The dictionary source could not be read or written.
    #[error("dictionary source {path}: {source}")]
    DictionarySource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Never surfaced to the user; the store rebuilds from source instead.
    #[error("dictionary cache unusable: {0}")]
    CacheCorruption(String),

    #[error("history persistence failed: {0}")]
    HistoryPersistence(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ImeError {
    pub fn source_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ImeError::DictionarySource {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImeError>;
