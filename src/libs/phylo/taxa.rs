use crate::libs::phylo::node::NodeId;
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Leaf labels of one parsed tree, keyed by node.
/// BTreeMap keeps iteration in arena (= parse) order.
pub type TaxonNames = BTreeMap<NodeId, String>;

/// Global taxon table: name <-> dense id, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct TaxaRegistry {
    names: IndexSet<String>,
}

impl TaxaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every name of a tree, returns the number of new taxa.
    pub fn insert_names(&mut self, names: &TaxonNames) -> usize {
        let before = self.names.len();
        for name in names.values() {
            self.names.insert(name.clone());
        }
        self.names.len() - before
    }

    pub fn gid(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    pub fn name(&self, gid: usize) -> &str {
        &self.names[gid]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }
}

/// Per-tree leaf table: node -> global id, and every occurrence of a global
/// id in insertion order.
#[derive(Debug, Default, Clone)]
pub struct TreeTaxaMap {
    gids: BTreeMap<NodeId, usize>,
    occurrences: BTreeMap<usize, Vec<NodeId>>,
}

impl TreeTaxaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names unknown to the registry are skipped.
    pub fn create(names: &TaxonNames, registry: &TaxaRegistry) -> Self {
        let mut map = Self::new();
        for (&node, name) in names {
            if let Some(gid) = registry.gid(name) {
                map.insert(node, gid);
            }
        }
        map
    }

    pub fn insert(&mut self, node: NodeId, gid: usize) {
        if let Some(old) = self.gids.insert(node, gid) {
            if let Some(nodes) = self.occurrences.get_mut(&old) {
                nodes.retain(|&n| n != node);
                if nodes.is_empty() {
                    self.occurrences.remove(&old);
                }
            }
        }
        self.occurrences.entry(gid).or_default().push(node);
    }

    pub fn remove(&mut self, node: NodeId) -> Option<usize> {
        let gid = self.gids.remove(&node)?;
        if let Some(nodes) = self.occurrences.get_mut(&gid) {
            nodes.retain(|&n| n != node);
            if nodes.is_empty() {
                self.occurrences.remove(&gid);
            }
        }
        Some(gid)
    }

    pub fn gid(&self, node: NodeId) -> Option<usize> {
        self.gids.get(&node).copied()
    }

    pub fn occurrences(&self, gid: usize) -> &[NodeId] {
        self.occurrences
            .get(&gid)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn count(&self, gid: usize) -> usize {
        self.occurrences(gid).len()
    }

    /// Number of distinct taxa
    pub fn unique_count(&self) -> usize {
        self.occurrences.len()
    }

    /// Number of labelled leaves
    pub fn leaf_count(&self) -> usize {
        self.gids.len()
    }

    /// Taxa present more than once
    pub fn multi_count(&self) -> usize {
        self.occurrences.values().filter(|v| v.len() > 1).count()
    }

    pub fn gids(&self) -> impl Iterator<Item = usize> + '_ {
        self.occurrences.keys().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.gids.keys().copied()
    }
}
