//! Position update service
//!
//! Applies a drag-and-drop ordering to the stored tree. Orderings that do not
//! map onto the stored nodes degrade to a full rebuild; storage failures are
//! returned to the caller with nothing committed.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::services::{Rebuilder, TreeLock};
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::ordering::{self, PayloadFormat};
use crate::domain::{
    parent_links, reindex, validate, BoundsMap, DomainError, DomainResult, Node, NodeId,
    OrderingRequest, ParentMap, ReindexOptions,
};
use crate::infrastructure::traits::NodeStore;

/// Result of a position update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionOutcome {
    /// Bounds written from the submitted ordering
    Reordered { nodes: usize },
    /// Ordering rejected; bounds recomputed from parent links instead
    Rebuilt { reason: DomainError, nodes: usize },
}

/// Service for applying submitted orderings.
pub struct PositionService {
    store: Arc<dyn NodeStore>,
    rebuilder: Arc<dyn Rebuilder>,
    lock: Arc<TreeLock>,
    options: ReindexOptions,
    id_prefix: String,
}

impl PositionService {
    /// Create a new position service.
    pub fn new(store: Arc<dyn NodeStore>, rebuilder: Arc<dyn Rebuilder>, lock: Arc<TreeLock>) -> Self {
        Self {
            store,
            rebuilder,
            lock,
            options: ReindexOptions::default(),
            id_prefix: String::new(),
        }
    }

    pub fn with_options(mut self, options: ReindexOptions) -> Self {
        self.options = options;
        self
    }

    /// Prefix stripped from element ids of form-encoded payloads.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Apply `request` to the stored tree.
    #[instrument(level = "debug", skip(self, request), fields(entries = request.len()))]
    pub fn update_positions(&self, request: &OrderingRequest) -> ApplicationResult<PositionOutcome> {
        let _guard = self.lock.lock();

        let nodes = self.store.load().with_context("load nodes")?;
        let known: BTreeSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        debug!("update_positions: {} stored nodes", known.len());

        match reindex(request, &known, self.options) {
            Ok(bounds) => {
                let parents = parent_links(request);
                if bounds.len() != nodes.len() {
                    if let Err(reason) = check_partial(&nodes, &bounds, &parents) {
                        return self.fall_back(reason);
                    }
                }
                self.store
                    .write_positions(&bounds, &parents)
                    .with_context("write positions")?;
                info!("reordered {} nodes", bounds.len());
                Ok(PositionOutcome::Reordered {
                    nodes: bounds.len(),
                })
            }
            Err(reason) if reason.requires_rebuild() => self.fall_back(reason),
            Err(e) => Err(e.into()),
        }
    }

    /// Decode a raw payload and apply it; undecodable payloads rebuild.
    pub fn update_positions_payload(
        &self,
        payload: &str,
        format: PayloadFormat,
    ) -> ApplicationResult<PositionOutcome> {
        match ordering::decode(payload, format, &self.id_prefix) {
            Ok(request) => self.update_positions(&request),
            Err(reason) => {
                let _guard = self.lock.lock();
                self.fall_back(reason)
            }
        }
    }

    fn fall_back(&self, reason: DomainError) -> ApplicationResult<PositionOutcome> {
        warn!("ordering rejected, rebuilding: {}", reason);
        let nodes = self.rebuilder.rebuild()?;
        Ok(PositionOutcome::Rebuilt { reason, nodes })
    }
}

/// A partial ordering is only written if the merged node set stays a valid
/// nested set; otherwise the unnamed nodes are reported as missing.
fn check_partial(nodes: &[Node], bounds: &BoundsMap, parents: &ParentMap) -> DomainResult<()> {
    let merged: Vec<Node> = nodes
        .iter()
        .cloned()
        .map(|mut node| {
            if let Some(b) = bounds.get(&node.id) {
                node.set_bounds(*b);
            }
            if let Some(parent) = parents.get(&node.id) {
                node.parent_id = *parent;
            }
            node
        })
        .collect();

    let violations = validate::check(&merged);
    if violations.is_empty() {
        return Ok(());
    }
    debug!("partial ordering breaks the tree: {:?}", violations);
    let missing = nodes
        .iter()
        .map(|n| n.id)
        .filter(|id| !bounds.contains_key(id))
        .collect();
    Err(DomainError::IncompleteOrdering { missing })
}
