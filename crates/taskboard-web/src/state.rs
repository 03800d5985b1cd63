use std::sync::Arc;

use taskboard_core::ports::SessionResolver;
use taskboard_core::{AccessGate, BoardRegistry};

/// Shared by every handler and by the middlewares.
#[derive(Clone)]
pub struct AppState {
    pub boards: Arc<BoardRegistry>,
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(boards: BoardRegistry, resolver: Arc<dyn SessionResolver>) -> Self {
        Self {
            boards: Arc::new(boards),
            gate: Arc::new(AccessGate::new(resolver)),
        }
    }
}
