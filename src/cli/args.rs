//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::{NodeId, PayloadFormat};

/// Nested-set tree maintenance: reorder, rebuild and check stored trees
#[derive(Parser, Debug)]
#[command(name = "rsnest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory holding .rsnest.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Node store file (overrides config)
    #[arg(long, global = true, env = "RSNEST_STORE", value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the stored forest
    List {
        /// Print one line per node instead of a tree
        #[arg(long)]
        flat: bool,
    },

    /// Show a single node
    Show {
        /// Node id
        id: u64,
    },

    /// Append a node
    Add {
        /// Parent node (default: new root)
        #[arg(short, long)]
        parent: Option<u64>,
    },

    /// Attach a node to another parent
    Move {
        /// Node id
        id: u64,
        /// New parent
        #[arg(short, long, conflicts_with = "root", required_unless_present = "root")]
        parent: Option<u64>,
        /// Make the node a root
        #[arg(long)]
        root: bool,
    },

    /// Delete a node and its descendants
    Remove {
        /// Node id
        id: u64,
    },

    /// Apply a submitted ordering
    Reorder {
        /// Ordering payload file ("-" for stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Payload encoding
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Recompute all bounds from parent links
    Rebuild,

    /// Verify nested-set invariants
    Check,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print effective settings
    Show,
    /// Print config file locations
    Path,
    /// Print a commented template
    Template,
}

/// Ordering payload encoding.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `[{"id": 1, "children": [...]}]`
    Json,
    /// Nested form encoding `{"ul": {"0": {"0": {"id": "node_1"}}}}`
    Form,
}

impl From<Format> for PayloadFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Json => PayloadFormat::Json,
            Format::Form => PayloadFormat::Form,
        }
    }
}

/// Convert a CLI id argument.
pub fn node_id(id: u64) -> NodeId {
    NodeId(id)
}
