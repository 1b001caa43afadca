//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (NodeStore, Rebuilder)
//! but are themselves concrete structs, not traits.
//!
//! All services sharing one store must share one [`TreeLock`]: every
//! read-compute-write sequence runs while holding it.

mod nodes;
mod positions;
mod rebuild;

pub use nodes::NodeService;
pub use positions::{PositionOutcome, PositionService};
pub use rebuild::{Rebuilder, StoreRebuilder};

/// Serializes tree mutations across services.
pub type TreeLock = parking_lot::Mutex<()>;
