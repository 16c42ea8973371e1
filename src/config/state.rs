// Shared application state
// Built once at startup and shared by every connection

use std::sync::atomic::AtomicUsize;

use super::Config;
use crate::api::ApiBackend;
use crate::handler::Dispatcher;

/// State shared across all connections
pub struct AppState {
    /// Static configuration loaded at startup
    pub config: Config,
    pub dispatcher: Dispatcher<ApiBackend>,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub const fn new(config: Config, dispatcher: Dispatcher<ApiBackend>) -> Self {
        Self {
            config,
            dispatcher,
            active_connections: AtomicUsize::new(0),
        }
    }
}
