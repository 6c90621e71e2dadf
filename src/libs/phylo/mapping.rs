use crate::libs::phylo::lca::LcaIndex;
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::taxa::TreeTaxaMap;
use crate::libs::phylo::tree::Tree;

/// Maps the nodes of one tree (the domain, e.g. the supertree) onto the
/// nodes of another (e.g. a gene tree).
///
/// Leaves are paired by taxon; an internal node maps to the LCA of its
/// children's images. `None` means "nothing below maps".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LcaMapping {
    map: Vec<Option<NodeId>>,
}

impl LcaMapping {
    pub fn new(len: usize) -> Self {
        Self {
            map: vec![None; len],
        }
    }

    pub fn get(&self, node: NodeId) -> Option<NodeId> {
        self.map.get(node).copied().flatten()
    }

    pub fn set(&mut self, node: NodeId, image: Option<NodeId>) {
        if node >= self.map.len() {
            self.map.resize(node + 1, None);
        }
        self.map[node] = image;
    }

    pub fn clear(&mut self) {
        self.map.iter_mut().for_each(|m| *m = None);
    }

    /// Pair the occurrences of taxon `gid` in both trees, first with first,
    /// second with second. Unmatched domain occurrences map to `None`.
    pub fn update_taxon(&mut self, gid: usize, from: &TreeTaxaMap, onto: &TreeTaxaMap) {
        let images = onto.occurrences(gid);
        for (i, &leaf) in from.occurrences(gid).iter().enumerate() {
            self.set(leaf, images.get(i).copied());
        }
    }

    pub fn update_leaves(&mut self, from: &TreeTaxaMap, onto: &TreeTaxaMap) {
        for gid in from.gids() {
            self.update_taxon(gid, from, onto);
        }
    }

    /// Recompute the image of one internal node from its children.
    pub fn update_internal(
        &mut self,
        lca: &LcaIndex,
        tree: &Tree,
        node: NodeId,
        parent: Option<NodeId>,
    ) {
        let image = tree
            .children(node, parent)
            .fold(None, |acc, c| lca.lca(acc, self.get(c)));
        self.set(node, image);
    }

    /// Recompute every internal node below `start`, bottom-up.
    /// Leaves, including a leaf used as the starting point, keep their pairing.
    pub fn update_internals(&mut self, lca: &LcaIndex, tree: &Tree, start: NodeId) {
        for visit in tree.dfs(start, None) {
            if visit.direction == crate::libs::phylo::tree::Direction::Postorder
                && !tree.is_leaf(visit.node)
            {
                self.update_internal(lca, tree, visit.node, visit.parent);
            }
        }
    }

    /// Number of nodes with an image
    pub fn mapped_count(&self) -> usize {
        self.map.iter().filter(|m| m.is_some()).count()
    }
}
