//! Full rebuild capability

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::rebuild_bounds;
use crate::infrastructure::traits::NodeStore;

/// Recomputes every node's bounds from stored parent links.
///
/// Callers hold the tree lock; implementations must not take it.
pub trait Rebuilder: Send + Sync {
    /// Returns the number of nodes rewritten.
    fn rebuild(&self) -> ApplicationResult<usize>;
}

/// Rebuilds the nodes of a store in one atomic write.
pub struct StoreRebuilder {
    store: Arc<dyn NodeStore>,
}

impl StoreRebuilder {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }
}

impl Rebuilder for StoreRebuilder {
    #[instrument(level = "debug", skip(self))]
    fn rebuild(&self) -> ApplicationResult<usize> {
        let nodes = self.store.load().with_context("load nodes")?;
        let bounds = rebuild_bounds(&nodes)?;
        self.store
            .write_bounds(&bounds)
            .with_context("write rebuilt bounds")?;
        info!("rebuilt {} nodes", bounds.len());
        Ok(bounds.len())
    }
}
