//! Server state management

use std::sync::Arc;
use crate::config::BackendConfig;
use super::shutdown::ShutdownState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BackendConfig>,
    pub shutdown: Arc<ShutdownState>,
}

impl AppState {
    pub fn new(config: BackendConfig) -> Self {
        let drain_timeout = config.server.drain_timeout;
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(ShutdownState::new(drain_timeout)),
        }
    }
}
