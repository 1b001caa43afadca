//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    NodeService, PositionService, Rebuilder, StoreRebuilder, TreeLock,
};
use crate::config::Settings;
use crate::infrastructure::store::JsonFileStore;
use crate::infrastructure::traits::NodeStore;

/// Container holding all application services.
///
/// Both services share the store, the rebuilder and one tree lock.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Node persistence
    pub store: Arc<dyn NodeStore>,

    pub positions: PositionService,
    pub nodes: NodeService,
}

impl ServiceContainer {
    /// Create a new service container backed by the configured JSON store.
    pub fn new(settings: Settings) -> Self {
        let store: Arc<dyn NodeStore> = Arc::new(JsonFileStore::new(&settings.store_path));
        Self::with_store(settings, store)
    }

    /// Create a service container on a custom store.
    pub fn with_store(settings: Settings, store: Arc<dyn NodeStore>) -> Self {
        let rebuilder: Arc<dyn Rebuilder> = Arc::new(StoreRebuilder::new(store.clone()));
        Self::with_deps(settings, store, rebuilder)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        store: Arc<dyn NodeStore>,
        rebuilder: Arc<dyn Rebuilder>,
    ) -> Self {
        let settings = Arc::new(settings);
        let lock = Arc::new(TreeLock::new(()));

        let positions = PositionService::new(store.clone(), rebuilder.clone(), lock.clone())
            .with_options(settings.reindex_options())
            .with_id_prefix(settings.id_prefix.clone());
        let nodes = NodeService::new(store.clone(), rebuilder, lock);

        Self {
            settings,
            store,
            positions,
            nodes,
        }
    }
}
