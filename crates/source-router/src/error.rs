use std::path::PathBuf;

use crate::model::Tilt;

/// Startup failures. Any of these must keep the process from serving traffic.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read rule table {path}: {source}")]
    RulesIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid rule table JSON: {0}")]
    RulesJson(#[from] serde_json::Error),

    #[error("bucket #{index}: {message}")]
    InvalidBucket { index: usize, message: String },

    #[error("duplicate bucket tag: {0}")]
    DuplicateTag(String),

    #[error("{tilt} fallback pool: {message}")]
    InvalidFallback { tilt: Tilt, message: String },

    #[error("tilt hints: {0}")]
    InvalidTiltHints(String),
}
