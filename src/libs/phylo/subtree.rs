//! Per-node indexes over one orientation of an undirected tree.

use crate::libs::phylo::lca::LcaIndex;
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::taxa::TreeTaxaMap;
use crate::libs::phylo::tree::{Direction, Tree};

/// Parent of every node when the tree is walked from a given start.
#[derive(Debug, Clone, Default)]
pub struct SubtreeParent {
    parent: Vec<Option<NodeId>>,
}

impl SubtreeParent {
    pub fn new(tree: &Tree, start: NodeId, parent: Option<NodeId>) -> Self {
        let mut table = vec![None; tree.capacity()];
        for visit in tree.dfs(start, parent) {
            if visit.direction == Direction::Preorder {
                table[visit.node] = visit.parent;
            }
        }
        Self { parent: table }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(node).copied().flatten()
    }

    pub fn update(&mut self, node: NodeId, parent: Option<NodeId>) {
        if node >= self.parent.len() {
            self.parent.resize(node + 1, None);
        }
        self.parent[node] = parent;
    }

    /// The other child of `node`'s parent, when that parent is binary.
    pub fn sibling_binary(&self, tree: &Tree, node: NodeId) -> Option<NodeId> {
        let p = self.parent(node)?;
        let pp = self.parent(p);
        let mut others = tree.children(p, pp).filter(|&c| c != node);
        let sibling = others.next()?;
        match others.next() {
            None => Some(sibling),
            Some(_) => None,
        }
    }
}

/// Preorder intervals: `u` lies below `v` iff its interval nests in `v`'s.
#[derive(Debug, Clone, Default)]
pub struct SubtreeInfoRooted {
    begin: Vec<usize>,
    end: Vec<usize>,
}

impl SubtreeInfoRooted {
    pub fn new(tree: &Tree, start: NodeId, parent: Option<NodeId>) -> Self {
        let mut begin = vec![usize::MAX; tree.capacity()];
        let mut end = vec![0; tree.capacity()];
        let mut clock = 0;
        for visit in tree.dfs(start, parent) {
            match visit.direction {
                Direction::Preorder => {
                    begin[visit.node] = clock;
                    clock += 1;
                }
                Direction::Postorder => end[visit.node] = clock,
                Direction::Inorder => {}
            }
        }
        Self { begin, end }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.begin.get(node).is_some_and(|&b| b != usize::MAX)
    }

    /// Whether `u` is `v` or one of its descendants
    pub fn is_contained(&self, u: NodeId, v: NodeId) -> bool {
        self.contains(u)
            && self.contains(v)
            && self.begin[v] <= self.begin[u]
            && self.end[u] <= self.end[v]
    }

    /// Number of nodes in the subtree of `v`
    pub fn subtree_nodes(&self, v: NodeId) -> usize {
        if self.contains(v) {
            self.end[v] - self.begin[v]
        } else {
            0
        }
    }
}

/// Number of leaves in every subtree. A leaf used as the starting point
/// counts itself, so the start holds the leaf total of the whole tree.
#[derive(Debug, Clone, Default)]
pub struct SubtreeSizes {
    sizes: Vec<usize>,
}

impl SubtreeSizes {
    pub fn new(tree: &Tree, start: NodeId, parent: Option<NodeId>) -> Self {
        let mut sizes = vec![0; tree.capacity()];
        for visit in tree.dfs(start, parent) {
            if visit.direction == Direction::Postorder {
                let below: usize = tree
                    .children(visit.node, visit.parent)
                    .map(|c| sizes[c])
                    .sum();
                sizes[visit.node] = below + usize::from(tree.is_leaf(visit.node));
            }
        }
        Self { sizes }
    }

    pub fn subtree_size(&self, v: NodeId) -> usize {
        self.sizes.get(v).copied().unwrap_or(0)
    }
}

/// Number of distinct taxa below every node of a rooted multi-labelled tree.
///
/// Each occurrence counts +1 and the LCA of consecutive occurrences (in tour
/// order) of the same taxon counts -1, so repeated labels are counted once.
#[derive(Debug, Clone, Default)]
pub struct ClusterSizesRooted {
    sizes: Vec<usize>,
}

impl ClusterSizesRooted {
    pub fn new(tree: &Tree, taxa: &TreeTaxaMap, lca: &LcaIndex) -> Self {
        let Some(root) = tree.get_root() else {
            return Self::default();
        };

        let mut order = vec![usize::MAX; tree.capacity()];
        for (i, v) in tree.preorder(root, None).into_iter().enumerate() {
            order[v] = i;
        }

        let mut delta = vec![0i64; tree.capacity()];
        for gid in taxa.gids() {
            let mut leaves: Vec<NodeId> = taxa
                .occurrences(gid)
                .iter()
                .copied()
                .filter(|&l| order[l] != usize::MAX)
                .collect();
            leaves.sort_by_key(|&l| order[l]);
            for (i, &leaf) in leaves.iter().enumerate() {
                delta[leaf] += 1;
                if i > 0 {
                    delta[lca.lca_of(leaves[i - 1], leaf)] -= 1;
                }
            }
        }

        let mut sizes = vec![0; tree.capacity()];
        for visit in tree.dfs(root, None) {
            if visit.direction == Direction::Postorder {
                let below: i64 = tree
                    .children(visit.node, visit.parent)
                    .map(|c| sizes[c] as i64)
                    .sum();
                sizes[visit.node] = (below + delta[visit.node]).max(0) as usize;
            }
        }
        Self { sizes }
    }

    pub fn cluster_size(&self, v: NodeId) -> usize {
        self.sizes.get(v).copied().unwrap_or(0)
    }
}
