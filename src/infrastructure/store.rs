//! Node store implementations: in-memory and JSON file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::{BoundsMap, Node, NodeId, ParentMap};
use crate::infrastructure::traits::NodeStore;

/// Whole node table as held in memory and on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTable {
    pub next_id: u64,
    #[serde(with = "node_list")]
    pub nodes: BTreeMap<NodeId, Node>,
}

impl NodeTable {
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let nodes: BTreeMap<NodeId, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let next_id = nodes.keys().map(|id| id.0).max().unwrap_or(0) + 1;
        Self { next_id, nodes }
    }

    fn load(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }

    fn insert(&mut self, parent: Option<NodeId>) -> io::Result<Node> {
        let depth = match parent {
            Some(parent_id) => self.get(parent_id)?.depth + 1,
            None => 0,
        };
        // A stale next_id must never reuse a stored id
        let max_id = self.nodes.keys().map(|id| id.0).max().unwrap_or(0);
        let next_id = self.next_id.max(max_id.saturating_add(1)).max(1);
        let max_rgt = self.nodes.values().map(|n| n.rgt).max().unwrap_or(0);
        let (lft, rgt) = max_rgt
            .checked_add(1)
            .and_then(|lft| Some((lft, lft.checked_add(1)?)))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("bound {max_rgt} leaves no room for a new node"),
                )
            })?;
        let node = Node {
            id: NodeId(next_id),
            parent_id: parent,
            lft,
            rgt,
            depth,
        };
        self.next_id = next_id + 1;
        self.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> io::Result<()> {
        if let Some(parent_id) = parent {
            self.get(parent_id)?;
        }
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| not_found(id))?;
        node.parent_id = parent;
        Ok(())
    }

    fn remove(&mut self, ids: &[NodeId]) -> io::Result<()> {
        if let Some(&missing) = ids.iter().find(|id| !self.nodes.contains_key(id)) {
            return Err(not_found(missing));
        }
        for id in ids {
            self.nodes.remove(id);
        }
        Ok(())
    }

    fn write_bounds(&mut self, bounds: &BoundsMap) -> io::Result<()> {
        if let Some(&missing) = bounds.keys().find(|id| !self.nodes.contains_key(id)) {
            return Err(not_found(missing));
        }
        for (id, b) in bounds {
            if let Some(node) = self.nodes.get_mut(id) {
                node.set_bounds(*b);
            }
        }
        Ok(())
    }

    fn write_positions(&mut self, bounds: &BoundsMap, parents: &ParentMap) -> io::Result<()> {
        let mut referenced = parents
            .iter()
            .flat_map(|(id, parent)| std::iter::once(*id).chain(*parent));
        if let Some(missing) = referenced.find(|id| !self.nodes.contains_key(id)) {
            return Err(not_found(missing));
        }
        self.write_bounds(bounds)?;
        for (id, parent) in parents {
            if let Some(node) = self.nodes.get_mut(id) {
                node.parent_id = *parent;
            }
        }
        Ok(())
    }

    fn get(&self, id: NodeId) -> io::Result<&Node> {
        self.nodes.get(&id).ok_or_else(|| not_found(id))
    }
}

fn not_found(id: NodeId) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("node {id} not in store"))
}

/// Serializes the table's nodes as a plain list.
mod node_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::domain::{Node, NodeId};

    pub fn serialize<S: Serializer>(
        nodes: &BTreeMap<NodeId, Node>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(nodes.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<NodeId, Node>, D::Error> {
        let nodes = Vec::<Node>::deserialize(deserializer)?;
        Ok(nodes.into_iter().map(|n| (n.id, n)).collect())
    }
}

/// In-memory store; mutations work on a copy that replaces the table on success.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<NodeTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            table: Mutex::new(NodeTable::from_nodes(nodes)),
        }
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut NodeTable) -> io::Result<T>) -> io::Result<T> {
        let mut table = self.table.lock();
        let mut draft = table.clone();
        let result = f(&mut draft)?;
        *table = draft;
        Ok(result)
    }
}

impl NodeStore for MemoryStore {
    fn load(&self) -> io::Result<Vec<Node>> {
        Ok(self.table.lock().load())
    }

    fn insert(&self, parent: Option<NodeId>) -> io::Result<Node> {
        self.mutate(|t| t.insert(parent))
    }

    fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> io::Result<()> {
        self.mutate(|t| t.set_parent(id, parent))
    }

    fn remove(&self, ids: &[NodeId]) -> io::Result<()> {
        self.mutate(|t| t.remove(ids))
    }

    fn write_bounds(&self, bounds: &BoundsMap) -> io::Result<()> {
        self.mutate(|t| t.write_bounds(bounds))
    }

    fn write_positions(&self, bounds: &BoundsMap, parents: &ParentMap) -> io::Result<()> {
        self.mutate(|t| t.write_positions(bounds, parents))
    }
}

/// JSON file store.
///
/// Each mutation reads the file, applies the change, writes a temp file in
/// the same directory and renames it over the original. A missing file is an
/// empty table.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> io::Result<NodeTable> {
        if !self.path.exists() {
            return Ok(NodeTable::default());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    #[instrument(level = "debug", skip(self, table), fields(path = %self.path.display()))]
    fn write_table(&self, table: &NodeTable) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, table)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        debug!("wrote {} nodes", table.nodes.len());
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut NodeTable) -> io::Result<T>) -> io::Result<T> {
        let mut table = self.read_table()?;
        let result = f(&mut table)?;
        self.write_table(&table)?;
        Ok(result)
    }
}

impl NodeStore for JsonFileStore {
    fn load(&self) -> io::Result<Vec<Node>> {
        Ok(self.read_table()?.load())
    }

    fn insert(&self, parent: Option<NodeId>) -> io::Result<Node> {
        self.mutate(|t| t.insert(parent))
    }

    fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> io::Result<()> {
        self.mutate(|t| t.set_parent(id, parent))
    }

    fn remove(&self, ids: &[NodeId]) -> io::Result<()> {
        self.mutate(|t| t.remove(ids))
    }

    fn write_bounds(&self, bounds: &BoundsMap) -> io::Result<()> {
        self.mutate(|t| t.write_bounds(bounds))
    }

    fn write_positions(&self, bounds: &BoundsMap, parents: &ParentMap) -> io::Result<()> {
        self.mutate(|t| t.write_positions(bounds, parents))
    }
}
