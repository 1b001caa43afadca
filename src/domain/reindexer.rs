//! Tree reindexer: nested-set bounds from a submitted ordering.
//!
//! Turns the nested ordering a drag-and-drop UI submits into left/right
//! bounds and depths. The reindexer never repairs a bad ordering: any
//! ordering it cannot map onto the known nodes yields an error whose
//! [`DomainError::requires_rebuild`] is true, and the caller falls back to a
//! full rebuild from parent pointers.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{BoundsMap, NodeId, OrderingEntry, OrderingRequest, ParentMap};

/// Reindexing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReindexOptions {
    /// Reject orderings that leave known nodes unmentioned.
    pub require_complete: bool,
}

impl Default for ReindexOptions {
    fn default() -> Self {
        Self {
            require_complete: true,
        }
    }
}

/// Computes bounds for every node named in `request`.
///
/// The result covers exactly the requested nodes, numbered 1..=2N in
/// pre-order; depth is the nesting level within the request.
#[instrument(level = "debug", skip(request, known), fields(requested = request.len(), known = known.len()))]
pub fn reindex(
    request: &OrderingRequest,
    known: &BTreeSet<NodeId>,
    options: ReindexOptions,
) -> DomainResult<BoundsMap> {
    let tree = build_request_tree(request, known)?;

    if options.require_complete && tree.len() != known.len() {
        let named: HashSet<NodeId> = tree.iter().map(|(_, node)| node.data.id).collect();
        let missing: Vec<NodeId> = known
            .iter()
            .filter(|id| !named.contains(id))
            .copied()
            .collect();
        return Err(DomainError::IncompleteOrdering { missing });
    }

    let bounds = tree.assign_bounds();
    debug!("reindexed {} nodes", bounds.len());
    Ok(bounds)
}

/// Parent link of every node named in `request`; top-level entries are roots.
pub fn parent_links(request: &OrderingRequest) -> ParentMap {
    let mut parents = ParentMap::new();
    let mut stack: Vec<(&OrderingEntry, Option<NodeId>)> =
        request.entries.iter().map(|e| (e, None)).collect();
    while let Some((entry, parent)) = stack.pop() {
        parents.insert(entry.id, parent);
        stack.extend(entry.children.iter().map(|c| (c, Some(entry.id))));
    }
    parents
}

/// Mirrors the request nesting into an arena, checking every id on the way.
fn build_request_tree(
    request: &OrderingRequest,
    known: &BTreeSet<NodeId>,
) -> DomainResult<TreeArena> {
    let mut tree = TreeArena::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<(&OrderingEntry, Option<generational_arena::Index>)> =
        request.entries.iter().rev().map(|e| (e, None)).collect();

    while let Some((entry, parent)) = stack.pop() {
        if !known.contains(&entry.id) {
            return Err(DomainError::UnknownNode(entry.id));
        }
        if !seen.insert(entry.id) {
            return Err(DomainError::DuplicateNode(entry.id));
        }

        let idx = tree.insert_node(
            NodeData {
                id: entry.id,
                stored: None,
            },
            parent,
        );
        // Reverse push keeps siblings in request order
        for child in entry.children.iter().rev() {
            stack.push((child, Some(idx)));
        }
    }

    Ok(tree)
}
