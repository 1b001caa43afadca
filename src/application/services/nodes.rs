//! Node service: list, create, read, move, delete, rebuild, check
//!
//! Every mutation ends with a full rebuild so stored bounds stay valid.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::{Rebuilder, TreeLock};
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{subtree_ids, validate, DomainError, Node, NodeId, TreeArena, TreeBuilder, Violation};
use crate::infrastructure::traits::NodeStore;

/// Service for node CRUD on a nested-set store.
pub struct NodeService {
    store: Arc<dyn NodeStore>,
    rebuilder: Arc<dyn Rebuilder>,
    lock: Arc<TreeLock>,
}

impl NodeService {
    /// Create a new node service.
    pub fn new(store: Arc<dyn NodeStore>, rebuilder: Arc<dyn Rebuilder>, lock: Arc<TreeLock>) -> Self {
        Self {
            store,
            rebuilder,
            lock,
        }
    }

    /// All nodes in tree order (by left bound, then id).
    pub fn list(&self) -> ApplicationResult<Vec<Node>> {
        let mut nodes = self.store.load().with_context("load nodes")?;
        nodes.sort_by_key(|n| (n.lft, n.id));
        Ok(nodes)
    }

    pub fn read(&self, id: NodeId) -> ApplicationResult<Node> {
        let nodes = self.store.load().with_context("load nodes")?;
        find(&nodes, id)
    }

    /// Forest built from parent links, siblings in stored order.
    pub fn forest(&self) -> ApplicationResult<TreeArena> {
        let nodes = self.store.load().with_context("load nodes")?;
        Ok(TreeBuilder::new(&nodes)?.build()?)
    }

    /// Append a node as last child of `parent` (or as last root).
    #[instrument(level = "debug", skip(self))]
    pub fn create(&self, parent: Option<NodeId>) -> ApplicationResult<Node> {
        let _guard = self.lock.lock();

        if let Some(parent_id) = parent {
            let nodes = self.store.load().with_context("load nodes")?;
            find(&nodes, parent_id)?;
        }
        let node = self.store.insert(parent).with_context("insert node")?;
        self.rebuilder.rebuild()?;
        info!("created node {}", node.id);

        let nodes = self.store.load().with_context("load nodes")?;
        find(&nodes, node.id)
    }

    /// Reattach `id` under `parent`, or make it a root.
    #[instrument(level = "debug", skip(self))]
    pub fn update_parent(&self, id: NodeId, parent: Option<NodeId>) -> ApplicationResult<Node> {
        let _guard = self.lock.lock();

        let nodes = self.store.load().with_context("load nodes")?;
        find(&nodes, id)?;
        if let Some(parent_id) = parent {
            find(&nodes, parent_id)?;
            if subtree_ids(&nodes, id)?.contains(&parent_id) {
                return Err(DomainError::InvalidMove {
                    node: id,
                    message: format!("{parent_id} is the node itself or one of its descendants"),
                }
                .into());
            }
        }

        self.store
            .set_parent(id, parent)
            .with_context("update parent")?;
        self.rebuilder.rebuild()?;
        debug!("moved node {} under {:?}", id, parent);

        let nodes = self.store.load().with_context("load nodes")?;
        find(&nodes, id)
    }

    /// Delete `id` and all its descendants; returns the removed ids.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        let _guard = self.lock.lock();

        let nodes = self.store.load().with_context("load nodes")?;
        let removed = subtree_ids(&nodes, id)?;
        self.store.remove(&removed).with_context("remove nodes")?;
        self.rebuilder.rebuild()?;
        info!("deleted {} nodes", removed.len());
        Ok(removed)
    }

    /// Recompute all bounds from parent links.
    pub fn rebuild(&self) -> ApplicationResult<usize> {
        let _guard = self.lock.lock();
        self.rebuilder.rebuild()
    }

    /// Nested-set invariant violations of the stored tree.
    pub fn check(&self) -> ApplicationResult<Vec<Violation>> {
        let nodes = self.store.load().with_context("load nodes")?;
        Ok(validate::check(&nodes))
    }
}

fn find(nodes: &[Node], id: NodeId) -> ApplicationResult<Node> {
    nodes
        .iter()
        .find(|n| n.id == id)
        .cloned()
        .ok_or_else(|| DomainError::NodeNotFound(id).into())
}
