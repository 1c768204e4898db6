use std::sync::Arc;

use crate::{configs::Config, player::AudioService, sources::SourceManager};

/// Top-level application state shared by every HTTP handler.
pub struct AppState {
    pub service: Arc<AudioService>,
    pub sources: Arc<SourceManager>,
    pub config: Config,
}

impl AppState {
    pub fn new(service: Arc<AudioService>, sources: Arc<SourceManager>, config: Config) -> Self {
        Self {
            service,
            sources,
            config,
        }
    }
}
