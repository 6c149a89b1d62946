pub mod bootstrap;
pub mod clients;
pub mod config;
pub mod events;
pub mod gateway;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod status;
pub mod store;

use std::sync::Arc;

use config::StoreConfig;
use events::EventBroadcaster;
use gateway::SharedGateway;
use orchestrator::Orchestrator;
use settings::Settings;
use store::Store;

/// Shared application state passed to every action handler and background
/// task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<StoreConfig>,
    pub store: Store,
    pub gateway: SharedGateway,
    pub broadcaster: EventBroadcaster,
    pub settings: Arc<Settings>,
}

impl AppContext {
    pub fn new(config: Arc<StoreConfig>, gateway: SharedGateway) -> Self {
        let settings = Arc::new(Settings::new(&config.data_dir));
        Self {
            config,
            store: Store::new(),
            gateway,
            broadcaster: EventBroadcaster::new(),
            settings,
        }
    }

    /// An orchestrator bound to this context's store, gateway, and
    /// broadcaster.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.store.clone(),
            self.gateway.clone(),
            self.broadcaster.clone(),
        )
    }

    /// Run the one-time startup sequence with this context's retry knobs.
    pub async fn bootstrap(&self) {
        bootstrap::initialize_with_retry(
            &self.store,
            &self.gateway,
            self.config.env_max_attempts,
            self.config.env_retry_delay,
        )
        .await;
    }
}
