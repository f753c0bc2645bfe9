// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, services::AssessmentService, storage::Storage};

#[derive(Clone)]
pub struct AppState {
    pub service: AssessmentService,
    pub config: Config,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            service: AssessmentService::new(storage),
            config,
        }
    }
}

impl FromRef<AppState> for AssessmentService {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
