use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

use crate::domain::{Bounds, BoundsMap, NodeId};

/// Data payload for forest nodes.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: NodeId,
    /// Bounds as currently stored, None for nodes built from an ordering request
    pub stored: Option<Bounds>,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stored {
            Some(bounds) => write!(f, "{} {}", self.id, bounds),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in sibling order
    pub children: Vec<Index>,
}

/// Arena-based forest.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Roots keep insertion order, which is the top-level sibling order.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order iteration over all trees, left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Enter/leave events of a depth-first walk over all trees.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(self)
    }

    /// Number of levels of the deepest tree, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn height(&self) -> usize {
        self.walk()
            .filter_map(|visit| match visit {
                Visit::Enter { depth, .. } => Some(depth as usize + 1),
                Visit::Leave { .. } => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Assigns nested-set bounds with the modified preorder tree traversal.
    ///
    /// A single counter starts at 1; entering a node records its left bound,
    /// leaving it records its right bound. N nodes occupy exactly 1..=2N.
    #[instrument(level = "debug", skip(self), fields(nodes = self.len()))]
    pub fn assign_bounds(&self) -> BoundsMap {
        let mut bounds = BoundsMap::new();
        let mut open: Vec<(u32, u32)> = Vec::new();
        let mut counter: u32 = 1;

        for visit in self.walk() {
            match visit {
                Visit::Enter { depth, .. } => {
                    open.push((counter, depth));
                    counter += 1;
                }
                Visit::Leave { node, .. } => {
                    if let Some((lft, depth)) = open.pop() {
                        bounds.insert(node.data.id, Bounds::new(lft, counter, depth));
                        counter += 1;
                    }
                }
            }
        }

        bounds
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots().iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Step of a depth-first walk.
#[derive(Debug)]
pub enum Visit<'a> {
    Enter { node: &'a TreeNode, depth: u32 },
    Leave { node: &'a TreeNode, depth: u32 },
}

pub struct Walk<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, u32, bool)>,
}

impl<'a> Walk<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena
            .roots()
            .iter()
            .rev()
            .map(|&root| (root, 0, false))
            .collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if visited {
                    return Some(Visit::Leave { node, depth });
                }
                self.stack.push((current_idx, depth, true));
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1, false));
                }
                return Some(Visit::Enter { node, depth });
            }
        }
        None
    }
}
