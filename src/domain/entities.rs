//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(NodeId)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

/// Nested-set position of a node: interval bounds plus depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub lft: u32,
    pub rgt: u32,
    pub depth: u32,
}

impl Bounds {
    pub fn new(lft: u32, rgt: u32, depth: u32) -> Self {
        Self { lft, rgt, depth }
    }

    /// True if `other` lies strictly inside this interval.
    pub fn contains(&self, other: &Bounds) -> bool {
        self.lft < other.lft && other.rgt < self.rgt
    }

    /// True if the two intervals share no position.
    pub fn is_disjoint(&self, other: &Bounds) -> bool {
        self.rgt < other.lft || other.rgt < self.lft
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] depth {}", self.lft, self.rgt, self.depth)
    }
}

/// Recomputed bounds keyed by node.
pub type BoundsMap = BTreeMap<NodeId, Bounds>;

/// Parent link per node (`None` for roots).
pub type ParentMap = BTreeMap<NodeId, Option<NodeId>>;

/// A stored tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// None for roots
    pub parent_id: Option<NodeId>,
    pub lft: u32,
    pub rgt: u32,
    pub depth: u32,
}

impl Node {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.lft, self.rgt, self.depth)
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.lft = bounds.lft;
        self.rgt = bounds.rgt;
        self.depth = bounds.depth;
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// One entry of an ordering request: a node and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingEntry {
    #[serde(deserialize_with = "crate::domain::ordering::deserialize_node_id")]
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OrderingEntry>,
}

impl OrderingEntry {
    pub fn leaf(id: u64) -> Self {
        Self {
            id: NodeId(id),
            children: Vec::new(),
        }
    }

    pub fn with_children(id: u64, children: Vec<OrderingEntry>) -> Self {
        Self {
            id: NodeId(id),
            children,
        }
    }
}

/// Desired shape of the tree: top-level entries in sibling order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderingRequest {
    pub entries: Vec<OrderingEntry>,
}

impl OrderingRequest {
    pub fn new(entries: Vec<OrderingEntry>) -> Self {
        Self { entries }
    }

    /// Flat list of top-level leaves, e.g. `[3, 2, 1]`.
    pub fn flat(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::new(ids.into_iter().map(OrderingEntry::leaf).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries at all nesting levels.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&OrderingEntry> = self.entries.iter().collect();
        while let Some(entry) = stack.pop() {
            count += 1;
            stack.extend(entry.children.iter());
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_intervals_when_comparing_then_contains_and_disjoint_agree() {
        let outer = Bounds::new(1, 6, 0);
        let inner = Bounds::new(2, 3, 1);
        let sibling = Bounds::new(7, 8, 0);

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.is_disjoint(&sibling));
        assert!(!outer.is_disjoint(&inner));
    }

    #[test]
    fn given_nested_request_when_len_then_counts_all_levels() {
        let request = OrderingRequest::new(vec![
            OrderingEntry::with_children(1, vec![OrderingEntry::leaf(2), OrderingEntry::leaf(3)]),
            OrderingEntry::leaf(4),
        ]);
        assert_eq!(request.len(), 4);
        assert!(!request.is_empty());
    }

    #[test]
    fn given_padded_string_when_parsing_node_id_then_trims() {
        assert_eq!(" 42 ".parse::<NodeId>().unwrap(), NodeId(42));
        assert!("abc".parse::<NodeId>().is_err());
    }
}
