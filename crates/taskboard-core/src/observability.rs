//! Logging bootstrap and the board status view.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::domain::TaskId;

#[derive(Debug, Error)]
pub enum TracingInitError {
    #[error("invalid log level `{level}`: {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseError,
    },

    #[error("tracing already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `level`. Calling this twice is harmless: the second
/// call reports that a subscriber is already set.
pub fn init_tracing(level: &str) -> Result<(), TracingInitError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|source| TracingInitError::InvalidLevel {
            level: level.to_string(),
            source,
        })?,
    };

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| TracingInitError::AlreadyInitialized(e.to_string()))
}

/// Snapshot of the board for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStatus {
    pub tasks: usize,
    pub loading: bool,
    pub mounted: bool,
    pub edit_open: bool,
    pub editing: Option<TaskId>,
    pub last_error: Option<String>,
}
