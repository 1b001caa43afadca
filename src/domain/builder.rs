//! Tree builder: reconstructs the forest from stored parent links.
//!
//! This is the full-rebuild path. It ignores stored bounds except as the
//! sibling sort key, so a corrupted or stale node set still yields a valid
//! nested set as long as the parent links form a forest.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{BoundsMap, Node, NodeId};

/// Constructs a forest from nodes and their parent links.
pub struct TreeBuilder<'a> {
    nodes: HashMap<NodeId, &'a Node>,
    children: BTreeMap<Option<NodeId>, Vec<&'a Node>>,
}

impl<'a> TreeBuilder<'a> {
    /// Index `nodes` by id and group them under their parent.
    ///
    /// Siblings are ordered by their stored left bound, then by id.
    pub fn new(nodes: &'a [Node]) -> DomainResult<Self> {
        let by_id: HashMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();

        for node in nodes {
            if let Some(parent) = node.parent_id {
                if !by_id.contains_key(&parent) {
                    return Err(DomainError::MissingParent {
                        node: node.id,
                        parent,
                    });
                }
            }
        }

        let children = nodes
            .iter()
            .sorted_by_key(|n| (n.lft, n.id))
            .fold(BTreeMap::new(), |mut acc: BTreeMap<_, Vec<_>>, node| {
                acc.entry(node.parent_id).or_default().push(node);
                acc
            });

        Ok(Self {
            nodes: by_id,
            children,
        })
    }

    /// Build the forest; every node must be reachable from a root.
    #[instrument(level = "debug", skip(self), fields(nodes = self.nodes.len()))]
    pub fn build(&self) -> DomainResult<TreeArena> {
        let mut tree = TreeArena::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<(&Node, Option<generational_arena::Index>)> = self
            .children_of(None)
            .iter()
            .rev()
            .map(|&n| (n, None))
            .collect();

        while let Some((node, parent_idx)) = stack.pop() {
            if !visited.insert(node.id) {
                return Err(DomainError::CycleDetected(node.id));
            }
            let idx = tree.insert_node(
                NodeData {
                    id: node.id,
                    stored: Some(node.bounds()),
                },
                parent_idx,
            );
            for &child in self.children_of(Some(node.id)).iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        // Nodes unreachable from any root sit on a parent cycle
        if visited.len() != self.nodes.len() {
            let stranded = self
                .nodes
                .keys()
                .filter(|id| !visited.contains(id))
                .min()
                .copied();
            if let Some(id) = stranded {
                return Err(DomainError::CycleDetected(id));
            }
        }

        debug!("built forest with {} roots", tree.roots().len());
        Ok(tree)
    }

    fn children_of(&self, parent: Option<NodeId>) -> &[&'a Node] {
        self.children
            .get(&parent)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Recompute bounds for the whole node set from parent links.
pub fn rebuild_bounds(nodes: &[Node]) -> DomainResult<BoundsMap> {
    let tree = TreeBuilder::new(nodes)?.build()?;
    Ok(tree.assign_bounds())
}

/// All ids in the subtree rooted at `root`, root first.
pub fn subtree_ids(nodes: &[Node], root: NodeId) -> DomainResult<Vec<NodeId>> {
    if !nodes.iter().any(|n| n.id == root) {
        return Err(DomainError::NodeNotFound(root));
    }
    let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id {
            children.entry(parent).or_default().push(node.id);
        }
    }

    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            return Err(DomainError::CycleDetected(id));
        }
        result.push(id);
        if let Some(kids) = children.get(&id) {
            stack.extend(kids.iter().rev());
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bounds;

    fn node(id: u64, parent: Option<u64>, lft: u32) -> Node {
        Node {
            id: NodeId(id),
            parent_id: parent.map(NodeId),
            lft,
            rgt: lft + 1,
            depth: 0,
        }
    }

    #[test]
    fn given_placeholder_bounds_when_rebuilding_then_orders_siblings_by_lft_then_id() {
        let nodes = vec![
            node(1, None, 5),
            node(2, None, 1),
            node(3, Some(2), 0),
            node(4, Some(2), 0),
        ];

        let bounds = rebuild_bounds(&nodes).unwrap();

        assert_eq!(bounds[&NodeId(2)], Bounds::new(1, 6, 0));
        assert_eq!(bounds[&NodeId(3)], Bounds::new(2, 3, 1));
        assert_eq!(bounds[&NodeId(4)], Bounds::new(4, 5, 1));
        assert_eq!(bounds[&NodeId(1)], Bounds::new(7, 8, 0));
    }

    #[test]
    fn given_dangling_parent_when_rebuilding_then_missing_parent() {
        let nodes = vec![node(1, None, 1), node(2, Some(9), 3)];
        let err = rebuild_bounds(&nodes).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingParent {
                node: NodeId(2),
                parent: NodeId(9)
            }
        );
    }

    #[test]
    fn given_parent_cycle_when_rebuilding_then_cycle_detected() {
        let nodes = vec![node(1, None, 1), node(2, Some(3), 3), node(3, Some(2), 5)];
        let err = rebuild_bounds(&nodes).unwrap_err();
        assert_eq!(err, DomainError::CycleDetected(NodeId(2)));
    }

    #[test]
    fn given_nested_nodes_when_collecting_subtree_then_includes_descendants_only() {
        let nodes = vec![
            node(1, None, 1),
            node(2, Some(1), 2),
            node(3, Some(2), 3),
            node(4, None, 9),
        ];
        let ids = subtree_ids(&nodes, NodeId(2)).unwrap();
        assert_eq!(ids, vec![NodeId(2), NodeId(3)]);
        assert_eq!(
            subtree_ids(&nodes, NodeId(8)).unwrap_err(),
            DomainError::NodeNotFound(NodeId(8))
        );
    }
}
