pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod store;

use std::sync::Arc;

use config::Config;
use realtime::dispatcher::FanoutDispatcher;
use realtime::registry::ConnectionRegistry;
use store::ChatStore;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub config: Arc<Config>,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<FanoutDispatcher>,
}

impl AppState {
    /// Wire up state around a store and config. The registry and dispatcher
    /// are constructed here and owned by this state — never global.
    pub fn new(store: Arc<dyn ChatStore>, config: Config) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(FanoutDispatcher::new(store.clone(), registry.clone()));
        Self {
            store,
            config: Arc::new(config),
            registry,
            dispatcher,
        }
    }
}
