use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::tree::Tree;

/// Constant-time lowest common ancestor queries on a rooted tree.
///
/// Euler tour plus a sparse table over the depth sequence. The index is a
/// snapshot: rebuild it after any change of topology or root.
#[derive(Debug, Clone, Default)]
pub struct LcaIndex {
    euler: Vec<NodeId>,
    depths: Vec<usize>,
    // first position of each node in the tour, usize::MAX when absent
    first: Vec<usize>,
    // sparse[k][i]: tour position of the shallowest entry in [i, i + 2^k)
    sparse: Vec<Vec<usize>>,
}

impl LcaIndex {
    pub fn new(tree: &Tree) -> Self {
        assert!(
            tree.get_root().is_some(),
            "LCA queries need a rooted tree"
        );

        let mut euler = Vec::new();
        let mut depths = Vec::new();
        let mut first = vec![usize::MAX; tree.capacity()];
        for (node, depth) in tree.euler_tour() {
            if first[node] == usize::MAX {
                first[node] = euler.len();
            }
            euler.push(node);
            depths.push(depth);
        }

        let m = euler.len();
        let mut sparse: Vec<Vec<usize>> = vec![(0..m).collect()];
        let mut k = 1;
        while (1 << k) <= m {
            let half = 1 << (k - 1);
            let prev = &sparse[k - 1];
            let row: Vec<usize> = (0..=m - (1 << k))
                .map(|i| {
                    let (a, b) = (prev[i], prev[i + half]);
                    if depths[b] < depths[a] {
                        b
                    } else {
                        a
                    }
                })
                .collect();
            sparse.push(row);
            k += 1;
        }

        Self {
            euler,
            depths,
            first,
            sparse,
        }
    }

    /// Length of the Euler tour
    pub fn len(&self) -> usize {
        self.euler.len()
    }

    pub fn is_empty(&self) -> bool {
        self.euler.is_empty()
    }

    /// Whether `node` was reachable from the root when the index was built.
    pub fn contains(&self, node: NodeId) -> bool {
        self.first.get(node).is_some_and(|&p| p != usize::MAX)
    }

    /// LCA where `None` stands for "no node": it is the identity.
    pub fn lca(&self, u: Option<NodeId>, v: Option<NodeId>) -> Option<NodeId> {
        match (u, v) {
            (Some(u), Some(v)) => Some(self.lca_of(u, v)),
            (Some(u), None) => Some(u),
            (None, v) => v,
        }
    }

    pub fn lca_of(&self, u: NodeId, v: NodeId) -> NodeId {
        assert!(
            self.contains(u) && self.contains(v),
            "Nodes {} and {} are not both in the indexed tree",
            u,
            v
        );
        let (mut l, mut r) = (self.first[u], self.first[v]);
        if l > r {
            std::mem::swap(&mut l, &mut r);
        }
        let len = r - l + 1;
        let k = (usize::BITS - 1 - len.leading_zeros()) as usize;
        let a = self.sparse[k][l];
        let b = self.sparse[k][r + 1 - (1 << k)];
        if self.depths[b] < self.depths[a] {
            self.euler[b]
        } else {
            self.euler[a]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_lca_small() {
        //    0
        //   / \
        //  1   2
        // / \
        //3   4
        let mut tree = Tree::new();
        for _ in 0..5 {
            tree.add_node();
        }
        tree.add_edge(0, 1);
        tree.add_edge(0, 2);
        tree.add_edge(1, 3);
        tree.add_edge(1, 4);
        tree.set_root(Some(0));

        let index = LcaIndex::new(&tree);
        assert_eq!(index.len(), 9);
        assert_eq!(index.lca_of(3, 4), 1);
        assert_eq!(index.lca_of(4, 2), 0);
        assert_eq!(index.lca_of(1, 3), 1);
        assert_eq!(index.lca_of(2, 2), 2);
        assert_eq!(index.lca(None, Some(2)), Some(2));
        assert_eq!(index.lca(Some(3), None), Some(3));
        assert_eq!(index.lca(None, None), None);
    }

    #[test]
    fn test_lca_random() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tree = Tree::new();
        let mut parent = vec![None];
        tree.add_node();
        for i in 1..200 {
            let p = rng.gen_range(0..i);
            tree.add_node();
            tree.add_edge(p, i);
            parent.push(Some(p));
        }
        tree.set_root(Some(0));
        let index = LcaIndex::new(&tree);

        let ancestors = |mut v: usize| {
            let mut path = vec![v];
            while let Some(p) = parent[v] {
                path.push(p);
                v = p;
            }
            path
        };
        for _ in 0..500 {
            let (u, v) = (rng.gen_range(0..200), rng.gen_range(0..200));
            let up = ancestors(u);
            let naive = ancestors(v).into_iter().find(|a| up.contains(a)).unwrap();
            assert_eq!(index.lca_of(u, v), naive);
        }
    }
}
