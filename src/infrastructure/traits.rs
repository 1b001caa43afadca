//! I/O boundary traits for testability
//!
//! These traits abstract node persistence, allowing services
//! to be tested with in-memory or failing implementations.

use std::io;

use crate::domain::{BoundsMap, Node, NodeId, ParentMap};

/// Persistent node table.
///
/// Every mutating call is all-or-nothing: on error nothing of the call is
/// observable through later `load` calls.
pub trait NodeStore: Send + Sync {
    /// Read the full node set.
    fn load(&self) -> io::Result<Vec<Node>>;

    /// Insert a node under `parent` with placeholder bounds after all others.
    fn insert(&self, parent: Option<NodeId>) -> io::Result<Node>;

    /// Change the parent link of `id`. Bounds are left as they are.
    fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> io::Result<()>;

    /// Delete the given nodes.
    fn remove(&self, ids: &[NodeId]) -> io::Result<()>;

    /// Overwrite bounds and depth of the given nodes.
    /// Fails without writing anything if any id is unknown.
    fn write_bounds(&self, bounds: &BoundsMap) -> io::Result<()>;

    /// Overwrite bounds, depth and parent link of the given nodes in one write.
    /// Fails without writing anything if any node or parent id is unknown.
    fn write_positions(&self, bounds: &BoundsMap, parents: &ParentMap) -> io::Result<()>;
}
