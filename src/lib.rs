//! rsnest: nested-set tree maintenance
//!
//! Stored trees carry `lft`/`rgt`/`depth` bounds from a pre-order walk.
//! Submitted orderings are turned into fresh bounds and persisted in one
//! write; orderings that do not fit the stored nodes fall back to a full
//! rebuild from parent links.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
