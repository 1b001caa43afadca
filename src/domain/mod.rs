//! Domain layer: entities and tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod ordering;
pub mod reindexer;
pub mod validate;

pub use arena::{NodeData, TreeArena, TreeNode, Visit};
pub use builder::{rebuild_bounds, subtree_ids, TreeBuilder};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use ordering::PayloadFormat;
pub use reindexer::{parent_links, reindex, ReindexOptions};
pub use validate::Violation;
