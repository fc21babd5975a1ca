use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::ml::Predictor;

/// Shared by every request handler. The predictor is read-only once serving starts.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(predictor: Predictor, config: ServiceConfig) -> Self {
        Self {
            predictor: Arc::new(predictor),
            config: Arc::new(config),
        }
    }
}
