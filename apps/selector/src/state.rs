use std::sync::Arc;

use crate::config::Config;
use crate::selection::value::ValueScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable combination scorer. Default: WeightedValueScorer built from config.
    pub scorer: Arc<dyn ValueScorer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let scorer = Arc::new(config.selection.scorer());
        Self { config, scorer }
    }
}
