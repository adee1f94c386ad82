use std::path::PathBuf;

use crate::error::RouterError;
use crate::notes::DEFAULT_MAX_NOTES;

/// Where the router's static inputs live.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// JSON rule table. `None` uses the table compiled into the crate.
    pub rules_path: Option<PathBuf>,
    /// Directory of house guidance notes; may be absent.
    pub notes_dir: PathBuf,
    /// Notes attached to each query.
    pub max_notes: usize,
}

impl RouterConfig {
    /// Optional:
    /// - `SOURCE_RULES_PATH`: JSON rule table (default: builtin table)
    /// - `HOUSE_NOTES_DIR`: notes directory (default: "house_notes")
    /// - `HOUSE_NOTES_MAX`: notes per query (default: 2)
    pub fn from_env() -> Result<Self, RouterError> {
        let rules_path = std::env::var("SOURCE_RULES_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let notes_dir = std::env::var("HOUSE_NOTES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("house_notes"));

        let max_notes = match std::env::var("HOUSE_NOTES_MAX") {
            Ok(raw) => raw.trim().parse::<usize>().map_err(|_| {
                RouterError::Config(format!(
                    "HOUSE_NOTES_MAX must be a non-negative integer, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_MAX_NOTES,
        };

        Ok(Self {
            rules_path,
            notes_dir,
            max_notes,
        })
    }
}
