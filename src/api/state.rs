//! Application state for the compensation engine API.

use std::sync::Arc;

use crate::config::{ConfigLoader, EngineConfig};

/// Shared application state.
///
/// Holds the loaded statutory configuration. Nothing in it is mutated after
/// startup, so requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the loaded engine configuration.
    pub fn engine_config(&self) -> &EngineConfig {
        self.config.config()
    }
}
