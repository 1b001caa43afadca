//! termtree rendering of arena forests

use generational_arena::Index;
use termtree::Tree;

use crate::domain::TreeArena;

pub trait TreeNodeConvert {
    /// One rendered tree per root, in sibling order.
    fn to_tree_strings(&self) -> Vec<Tree<String>>;
}

impl TreeNodeConvert for TreeArena {
    fn to_tree_strings(&self) -> Vec<Tree<String>> {
        fn build_tree(arena: &TreeArena, node_idx: Index) -> Option<Tree<String>> {
            let node = arena.get_node(node_idx)?;
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build_tree(arena, child))
                .collect();
            Some(Tree::new(node.data.to_string()).with_leaves(leaves))
        }

        self.roots()
            .iter()
            .filter_map(|&root| build_tree(self, root))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bounds, NodeData, NodeId};

    #[test]
    fn given_two_roots_when_rendering_then_one_tree_each() {
        let mut arena = TreeArena::new();
        let root = arena.insert_node(
            NodeData {
                id: NodeId(1),
                stored: Some(Bounds::new(1, 4, 0)),
            },
            None,
        );
        arena.insert_node(
            NodeData {
                id: NodeId(2),
                stored: Some(Bounds::new(2, 3, 1)),
            },
            Some(root),
        );
        arena.insert_node(
            NodeData {
                id: NodeId(3),
                stored: None,
            },
            None,
        );

        let trees = arena.to_tree_strings();

        assert_eq!(trees.len(), 2);
        let first = trees[0].to_string();
        assert!(first.starts_with("1 [1, 4] depth 0"));
        assert!(first.contains("2 [2, 3] depth 1"));
        assert_eq!(trees[1].to_string().trim_end(), "3");
    }
}
