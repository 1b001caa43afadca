//! Nested-set invariant checks over a stored node set.

use std::collections::HashMap;
use std::fmt;

use crate::domain::{Node, NodeId};

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// left >= right
    InvertedBounds { node: NodeId, lft: u32, rgt: u32 },
    /// A bound value used by more than one node or twice by one node
    DuplicateBound { value: u32 },
    /// A bound outside 1..=2N
    BoundOutOfRange { node: NodeId, value: u32 },
    /// Two intervals overlap without one containing the other
    PartialOverlap { a: NodeId, b: NodeId },
    /// Parent interval does not contain the child interval
    NotContained { node: NodeId, parent: NodeId },
    /// Depth differs from the parent-link depth
    WrongDepth { node: NodeId, expected: u32, actual: u32 },
    /// Parent link points to an unknown node
    MissingParent { node: NodeId, parent: NodeId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InvertedBounds { node, lft, rgt } => {
                write!(f, "node {node}: left {lft} is not below right {rgt}")
            }
            Violation::DuplicateBound { value } => write!(f, "bound {value} used more than once"),
            Violation::BoundOutOfRange { node, value } => {
                write!(f, "node {node}: bound {value} outside the valid range")
            }
            Violation::PartialOverlap { a, b } => {
                write!(f, "nodes {a} and {b} partially overlap")
            }
            Violation::NotContained { node, parent } => {
                write!(f, "node {node} lies outside its parent {parent}")
            }
            Violation::WrongDepth {
                node,
                expected,
                actual,
            } => write!(f, "node {node}: depth {actual}, expected {expected}"),
            Violation::MissingParent { node, parent } => {
                write!(f, "node {node} references missing parent {parent}")
            }
        }
    }
}

/// Check every nested-set invariant; an empty result means the set is valid.
pub fn check(nodes: &[Node]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let max_bound = max_bound(nodes.len());
    let by_id: HashMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();

    let mut uses: HashMap<u32, usize> = HashMap::new();
    for node in nodes {
        if node.lft >= node.rgt {
            violations.push(Violation::InvertedBounds {
                node: node.id,
                lft: node.lft,
                rgt: node.rgt,
            });
        }
        for value in [node.lft, node.rgt] {
            if value == 0 || value > max_bound {
                violations.push(Violation::BoundOutOfRange {
                    node: node.id,
                    value,
                });
            }
            *uses.entry(value).or_default() += 1;
        }
    }
    let mut duplicates: Vec<u32> = uses
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(value, _)| value)
        .collect();
    duplicates.sort_unstable();
    violations.extend(
        duplicates
            .into_iter()
            .map(|value| Violation::DuplicateBound { value }),
    );

    // Sweep in left-bound order: overlap can only occur with an earlier interval
    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by_key(|n| (n.lft, n.id));
    for (i, a) in sorted.iter().enumerate() {
        for b in sorted.iter().skip(i + 1) {
            if b.lft > a.rgt {
                break;
            }
            let (ab, bb) = (a.bounds(), b.bounds());
            if !ab.contains(&bb) && !bb.contains(&ab) && !ab.is_disjoint(&bb) {
                violations.push(Violation::PartialOverlap { a: a.id, b: b.id });
            }
        }
    }

    for node in nodes {
        match node.parent_id {
            None => {
                if node.depth != 0 {
                    violations.push(Violation::WrongDepth {
                        node: node.id,
                        expected: 0,
                        actual: node.depth,
                    });
                }
            }
            Some(parent_id) => match by_id.get(&parent_id) {
                None => violations.push(Violation::MissingParent {
                    node: node.id,
                    parent: parent_id,
                }),
                Some(parent) => {
                    if !parent.bounds().contains(&node.bounds()) {
                        violations.push(Violation::NotContained {
                            node: node.id,
                            parent: parent.id,
                        });
                    }
                    if node.depth != parent.depth + 1 {
                        violations.push(Violation::WrongDepth {
                            node: node.id,
                            expected: parent.depth + 1,
                            actual: node.depth,
                        });
                    }
                }
            },
        }
    }

    violations
}

/// Largest valid bound for `len` nodes, saturating at `u32::MAX`.
fn max_bound(len: usize) -> u32 {
    len.checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(u32::MAX)
}
