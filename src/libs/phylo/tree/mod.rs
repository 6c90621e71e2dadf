pub mod ops;
#[cfg(test)]
pub mod tests;
pub mod traversal;

use super::node::{Node, NodeId};
pub use traversal::{Dfs, Direction, EulerTour, Visit};

/// Undirected tree stored as an arena of adjacency lists.
///
/// A tree is rooted when `root` is set; the root is an ordinary node
/// (usually of degree 2) and every traversal takes an explicit starting
/// node, so the same storage serves rooted and unrooted views.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tree {
    /// Arena storage for all nodes
    pub(super) nodes: Vec<Node>,

    /// Optional root ID
    pub(super) root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new isolated node to the tree. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Size of the arena, deleted slots included.
    /// Per-node side tables are sized with this.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: Option<NodeId>) {
        self.root = id;
    }

    pub fn get_node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn adjacent(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].adjacent
    }

    /// Neighbours of `id` other than `parent`.
    pub fn children(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id]
            .adjacent
            .iter()
            .copied()
            .filter(move |&n| Some(n) != parent)
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.nodes[id].degree()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].is_leaf()
    }

    pub fn is_fake(&self, id: NodeId) -> bool {
        self.nodes[id].is_fake
    }

    pub fn is_adjacent(&self, u: NodeId, v: NodeId) -> bool {
        self.nodes[u].adjacent.contains(&v)
    }

    /// Live nodes of degree at most one, in arena order
    pub fn get_leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !n.deleted && n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// Live internal nodes, in arena order
    pub fn get_internals(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !n.deleted && !n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// Every internal node has degree 3, except a root which may have
    /// degree 2 (rooted binary) or 3 (unrooted binary drawn from a node).
    pub fn is_binary(&self) -> bool {
        self.nodes
            .iter()
            .filter(|n| !n.deleted && !n.is_leaf())
            .all(|n| match n.degree() {
                3 => true,
                2 => self.root == Some(n.id),
                _ => false,
            })
    }

    /// Drop every branch length, e.g. after the tree has been rearranged.
    pub fn clear_lengths(&mut self) {
        for node in self.nodes.iter_mut() {
            node.length = None;
        }
    }

    // --- Delegation to ops ---

    pub fn add_edge(&mut self, u: NodeId, v: NodeId) {
        ops::add_edge(self, u, v)
    }

    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        ops::remove_edge(self, u, v)
    }

    pub fn suppress(&mut self, id: NodeId) -> Result<(), String> {
        ops::suppress(self, id)
    }

    pub fn root_by(&mut self, u: NodeId, v: NodeId) -> NodeId {
        ops::root_by(self, u, v)
    }

    pub fn root_by_leaf(&mut self, leaf: NodeId) -> Result<NodeId, String> {
        ops::root_by_leaf(self, leaf)
    }

    pub fn unroot(&mut self) {
        ops::unroot(self)
    }

    pub fn trim_leaf(&mut self, leaf: NodeId) -> Result<(), String> {
        ops::trim_leaf(self, leaf)
    }

    pub fn extend_leaf(&mut self, leaf: NodeId, copies: usize) -> (NodeId, Vec<NodeId>) {
        ops::extend_leaf(self, leaf, copies)
    }

    pub fn contract_hub(
        &mut self,
        hub: NodeId,
        keep: NodeId,
        dropped: &[NodeId],
    ) -> Result<(), String> {
        ops::contract_hub(self, hub, keep, dropped)
    }

    pub fn spr(&mut self, n: NodeId, pn: NodeId, u: NodeId, v: NodeId) -> bool {
        ops::spr(self, n, pn, u, v)
    }

    pub fn spr_to_edge(&mut self, x: NodeId, y: NodeId, u: NodeId) -> bool {
        ops::spr_to_edge(self, x, y, u)
    }

    pub fn spr_to_root(&mut self, u: NodeId, pu: NodeId) -> bool {
        ops::spr_to_root(self, u, pu)
    }

    pub fn spr_from_root(&mut self, c: NodeId, r: NodeId, u: NodeId, v: NodeId) -> bool {
        ops::spr_from_root(self, c, r, u, v)
    }

    pub fn move_subtree(&mut self, a: NodeId, b: NodeId, c: NodeId, y: NodeId) {
        ops::move_subtree(self, a, b, c, y)
    }

    // --- Delegation to traversal ---

    pub fn dfs(&self, start: NodeId, parent: Option<NodeId>) -> Dfs<'_> {
        Dfs::new(self, start, parent)
    }

    pub fn euler_tour(&self) -> EulerTour<'_> {
        EulerTour::new(self)
    }

    pub fn preorder(&self, start: NodeId, parent: Option<NodeId>) -> Vec<NodeId> {
        traversal::preorder(self, start, parent)
    }

    pub fn postorder(&self, start: NodeId, parent: Option<NodeId>) -> Vec<NodeId> {
        traversal::postorder(self, start, parent)
    }
}
