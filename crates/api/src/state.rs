//! Application state

use prereq_engine::EngineContext;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineContext>,
    /// Recorded as the actor of rule changes without an `X-Actor` header
    pub default_actor: String,
}

impl AppState {
    pub fn new(engine: EngineContext, default_actor: &str) -> Self {
        Self {
            engine: Arc::new(engine),
            default_actor: default_actor.to_string(),
        }
    }
}
