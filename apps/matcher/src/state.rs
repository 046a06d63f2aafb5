use std::sync::Arc;

use crate::config::Config;
use crate::scoring::ModelService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the active scoring backend (trained model or fallback matcher).
    pub service: Arc<ModelService>,
}
