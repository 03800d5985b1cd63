use thiserror::Error;

use crate::domain::{StoreError, TaskField};

/// Why the last board operation did not apply.
///
/// Recorded on the board and logged; never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("required field `{0}` is empty")]
    MissingField(TaskField),

    #[error("no task is being edited")]
    NoTaskSelected,
}
