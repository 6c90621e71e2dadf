//! Robinson-Foulds distance between the supertree and a multi-labelled gene
//! tree, in full and as per-node incremental updates.
//!
//! Both trees are viewed from a common anchor taxon: the gene tree is rooted
//! on the anchor's pendant edge and the supertree is walked from the paired
//! leaf. With leaves paired one-to-one, every internal node of the supertree
//! maps to the LCA of its images, and a node "matches" when its image has
//! the same number of paired leaves. Then
//!
//! ```text
//! RF = s_int + g_int - 2 * matched
//! ```
//!
//! where `s_int`/`g_int` count nodes branching into at least two paired
//! subtrees and `matched` counts distinct matched gene nodes. Unpaired leaves
//! on either side (taxa missing from one tree, surplus copies) drop out.

use crate::libs::phylo::lca::LcaIndex;
use crate::libs::phylo::mapping::LcaMapping;
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::subtree::SubtreeParent;
use crate::libs::phylo::taxa::TreeTaxaMap;
use crate::libs::phylo::tree::{Direction, Tree};

/// Scores closer than this are equal.
pub const EPSILON: f64 = 1e-5;

/// A gene tree prepared for scoring.
#[derive(Debug, Clone)]
pub struct GeneTree {
    pub tree: Tree,
    pub taxa: TreeTaxaMap,
    pub weight: f64,
    lca: LcaIndex,
    anchor: Option<NodeId>,
    internal: i64,
    // gene leaf -> supertree leaf
    partner: Vec<Option<NodeId>>,
}

impl GeneTree {
    pub fn new(tree: Tree, taxa: TreeTaxaMap, weight: f64) -> Self {
        Self {
            tree,
            taxa,
            weight,
            lca: LcaIndex::default(),
            anchor: None,
            internal: 0,
            partner: Vec::new(),
        }
    }

    pub fn lca(&self) -> &LcaIndex {
        &self.lca
    }

    /// Leaf the tree is currently rooted at
    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    /// Branching nodes below the root
    pub fn internal(&self) -> i64 {
        self.internal
    }

    /// Supertree leaf paired with gene leaf `leaf`
    pub fn partner(&self, leaf: NodeId) -> Option<NodeId> {
        self.partner.get(leaf).copied().flatten()
    }

    /// Rebuild the gene -> supertree pairing from the supertree leaves'
    /// mapping. Returns the number of paired leaves.
    pub fn sync_partners(
        &mut self,
        leaves: &LcaMapping,
        s_leaves: impl Iterator<Item = NodeId>,
    ) -> usize {
        self.partner = vec![None; self.tree.capacity()];
        let mut paired = 0;
        for s in s_leaves {
            if let Some(g) = leaves.get(s) {
                self.partner[g] = Some(s);
                paired += 1;
            }
        }
        paired
    }

    /// First paired leaf in taxon-table order
    pub fn first_paired(&self) -> Option<NodeId> {
        self.taxa.nodes().find(|&g| self.partner(g).is_some())
    }

    /// Root on the pendant edge of `anchor` (rebuilding the LCA index when
    /// the root moves) and recompute cluster sizes and `g_int`.
    /// Returns false when `anchor` cannot carry a root.
    pub fn prepare(&mut self, anchor: NodeId) -> bool {
        if self.anchor != Some(anchor) {
            if self.tree.root_by_leaf(anchor).is_err() {
                return false;
            }
            self.lca = LcaIndex::new(&self.tree);
            self.anchor = Some(anchor);
        }
        let Some(root) = self.tree.get_root() else {
            return false;
        };

        self.internal = 0;
        let mut clusters = vec![0u32; self.tree.capacity()];
        for visit in self.tree.dfs(root, None) {
            if visit.direction != Direction::Postorder {
                continue;
            }
            let v = visit.node;
            if self.tree.is_leaf(v) {
                clusters[v] = u32::from(self.partner(v).is_some());
            } else {
                let mut branches = 0;
                for c in self.tree.children(v, visit.parent) {
                    clusters[v] += clusters[c];
                    if clusters[c] > 0 {
                        branches += 1;
                    }
                }
                if v != root && branches >= 2 {
                    self.internal += 1;
                }
            }
        }

        for (v, cs) in clusters.into_iter().enumerate() {
            let node = self.tree.get_node_mut(v);
            node.cluster_size = cs;
            node.score = 0;
        }
        true
    }
}

/// Supertree-side scoring state for one gene tree and one anchor.
#[derive(Debug, Clone)]
pub struct RfState {
    pub mapping: LcaMapping,
    pub parents: SubtreeParent,
    clusters: Vec<u32>,
    anchor: NodeId,
    s_internal: i64,
    matched: i64,
}

impl RfState {
    /// Full computation. `gene` must have been prepared on the partner of
    /// `anchor`; `leaves` holds the supertree leaf pairing.
    pub fn new(stree: &Tree, anchor: NodeId, gene: &mut GeneTree, leaves: &LcaMapping) -> Self {
        let mut mapping = leaves.clone();
        mapping.update_internals(&gene.lca, stree, anchor);

        let mut state = Self {
            mapping,
            parents: SubtreeParent::new(stree, anchor, None),
            clusters: vec![0; stree.capacity()],
            anchor,
            s_internal: 0,
            matched: 0,
        };

        for v in stree.postorder(anchor, None) {
            if v == anchor {
                continue;
            }
            if stree.is_leaf(v) {
                state.clusters[v] = u32::from(state.mapping.get(v).is_some());
            } else {
                let parent = state.parents.parent(v);
                state.clusters[v] = stree.children(v, parent).map(|c| state.clusters[c]).sum();
                state.new_map_chg(stree, gene, v);
            }
        }
        state
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn cluster_size(&self, v: NodeId) -> u32 {
        self.clusters.get(v).copied().unwrap_or(0)
    }

    pub fn rf(&self, gene: &GeneTree) -> i64 {
        self.s_internal + gene.internal - 2 * self.matched
    }

    fn is_branching(&self, stree: &Tree, v: NodeId) -> bool {
        stree
            .children(v, self.parents.parent(v))
            .filter(|&c| self.clusters[c] > 0)
            .count()
            >= 2
    }

    fn matching(&self, gene: &GeneTree, v: NodeId) -> Option<NodeId> {
        let g = self.mapping.get(v)?;
        let node = gene.tree.get_node(g);
        let cs = self.clusters[v];
        (cs > 0
            && !node.is_leaf()
            && gene.tree.get_root() != Some(g)
            && node.cluster_size == cs)
            .then_some(g)
    }

    /// Withdraw the contribution of internal node `v`; returns the change of RF.
    pub fn old_map_chg(&mut self, stree: &Tree, gene: &mut GeneTree, v: NodeId) -> i64 {
        let mut delta = 0;
        if self.is_branching(stree, v) {
            self.s_internal -= 1;
            delta -= 1;
        }
        if let Some(g) = self.matching(gene, v) {
            let node = gene.tree.get_node_mut(g);
            node.score -= 1;
            if node.score == 0 {
                self.matched -= 1;
                delta += 2;
            }
        }
        delta
    }

    /// Add the contribution of internal node `v`; returns the change of RF.
    pub fn new_map_chg(&mut self, stree: &Tree, gene: &mut GeneTree, v: NodeId) -> i64 {
        let mut delta = 0;
        if self.is_branching(stree, v) {
            self.s_internal += 1;
            delta += 1;
        }
        if let Some(g) = self.matching(gene, v) {
            let node = gene.tree.get_node_mut(g);
            node.score += 1;
            if node.score == 1 {
                self.matched += 1;
                delta -= 2;
            }
        }
        delta
    }

    /// Recompute cluster size and image of `v` from its children.
    pub fn refresh(&mut self, stree: &Tree, gene: &GeneTree, v: NodeId) {
        let parent = self.parents.parent(v);
        self.clusters[v] = stree.children(v, parent).map(|c| self.clusters[c]).sum();
        self.mapping.update_internal(&gene.lca, stree, v, parent);
    }

    /// Before [`Tree::move_subtree`] slides attachment `y` across `q`:
    /// withdraw the two nodes whose children change.
    pub fn retract(&mut self, stree: &Tree, gene: &mut GeneTree, y: NodeId, q: NodeId) -> i64 {
        self.old_map_chg(stree, gene, y) + self.old_map_chg(stree, gene, q)
    }

    /// After `y` moved from edge (a, q) to edge (q, b): fix the parents of
    /// the nodes around `y` and `q`, recompute both and add them back.
    pub fn reattach(
        &mut self,
        stree: &Tree,
        gene: &mut GeneTree,
        y: NodeId,
        a: NodeId,
        q: NodeId,
        b: NodeId,
    ) -> i64 {
        // Which of y and q now sits above the other depends on where the
        // anchor lies relative to the slide.
        let pq = self.parents.parent(q);
        let (upper, lower, outer) = if pq == Some(b) {
            (y, q, b)
        } else if pq == Some(y) {
            (q, y, a)
        } else {
            match pq {
                Some(p) => (q, y, p),
                None => panic!("Node {} cannot slide past the anchor", q),
            }
        };

        self.parents.update(upper, Some(outer));
        self.parents.update(lower, Some(upper));
        for c in stree.children(lower, Some(upper)) {
            self.parents.update(c, Some(lower));
        }
        for c in stree.children(upper, Some(outer)) {
            self.parents.update(c, Some(upper));
        }

        self.refresh(stree, gene, lower);
        self.refresh(stree, gene, upper);
        self.new_map_chg(stree, gene, lower) + self.new_map_chg(stree, gene, upper)
    }
}

/// Full RF score of the supertree against one gene tree.
/// Trees sharing fewer than two paired leaves score 0.
pub fn rf_score(stree: &Tree, gene: &mut GeneTree, leaves: &LcaMapping) -> i64 {
    let Some(g_anchor) = gene
        .anchor()
        .filter(|&a| gene.partner(a).is_some())
        .or_else(|| gene.first_paired())
    else {
        return 0;
    };
    let Some(s_anchor) = gene.partner(g_anchor) else {
        return 0;
    };
    if !gene.prepare(g_anchor) {
        return 0;
    }
    RfState::new(stree, s_anchor, gene, leaves).rf(gene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::phylo::parser::parse_newick;
    use crate::libs::phylo::taxa::{TaxaRegistry, TaxonNames};
    use fixedbitset::FixedBitSet;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    struct Pair {
        stree: Tree,
        s_taxa: TreeTaxaMap,
        gene: GeneTree,
        leaves: LcaMapping,
    }

    fn pair(stree: Tree, s_names: &TaxonNames, gtree: Tree, g_names: &TaxonNames) -> Pair {
        let mut registry = TaxaRegistry::new();
        registry.insert_names(s_names);
        registry.insert_names(g_names);
        let s_taxa = TreeTaxaMap::create(s_names, &registry);
        let g_taxa = TreeTaxaMap::create(g_names, &registry);

        let mut gene = GeneTree::new(gtree, g_taxa, 1.0);
        let mut leaves = LcaMapping::new(stree.capacity());
        leaves.update_leaves(&s_taxa, &gene.taxa);
        gene.sync_partners(&leaves, s_taxa.nodes());
        Pair {
            stree,
            s_taxa,
            gene,
            leaves,
        }
    }

    fn score(species: &str, gene: &str) -> i64 {
        let s = parse_newick(species).unwrap();
        let g = parse_newick(gene).unwrap();
        let mut s_tree = s.tree;
        s_tree.unroot();
        let mut p = pair(s_tree, &s.names, g.tree, &g.names);
        rf_score(&p.stree, &mut p.gene, &p.leaves)
    }

    #[test]
    fn test_quartets() {
        assert_eq!(score("((A,B),(C,D));", "(((A,B),C),D);"), 0);
        assert_eq!(score("((A,B),(C,D));", "((A,C),(B,D));"), 2);
        assert_eq!(score("((A,B),(C,D));", "((A,D),(B,C));"), 2);
        // unresolved gene tree
        assert_eq!(score("((A,B),(C,D));", "(A,B,C,D);"), 1);
    }

    #[test]
    fn test_partial_taxa() {
        // restricted to {A,B,C,D} both are AB|CD
        assert_eq!(score("(((A,E),B),(C,D));", "((A,B),(C,D));"), 0);
        // a gene tree with taxa unknown to the supertree
        assert_eq!(score("((A,B),(C,D));", "((A,B),((C,X),D));"), 0);
        // three shared leaves carry no split
        assert_eq!(score("((A,B),(C,D));", "((A,C),B);"), 0);
    }

    #[test]
    fn test_multi_labelled() {
        // a supertree hub with two copies of A
        let s = parse_newick("(A,B);").unwrap();
        let g = parse_newick("((A,A),B);").unwrap();
        let mut stree = s.tree;
        stree.unroot();
        let mut p = pair(stree, &s.names, g.tree, &g.names);

        let a = p.s_taxa.occurrences(0)[0];
        let (hub, extra) = p.stree.extend_leaf(a, 2);
        p.s_taxa.insert(extra[0], 0);
        p.leaves.update_leaves(&p.s_taxa, &p.gene.taxa);
        p.gene.sync_partners(&p.leaves, p.s_taxa.nodes());

        assert_eq!(rf_score(&p.stree, &mut p.gene, &p.leaves), 0);

        // viewed from B the hub holds both copies of A
        let b = p.s_taxa.occurrences(1)[0];
        let g_b = p.gene.taxa.occurrences(1)[0];
        assert!(p.gene.prepare(g_b));
        let state = RfState::new(&p.stree, b, &mut p.gene, &p.leaves);
        assert_eq!(state.cluster_size(hub), 2);
        assert_eq!(state.rf(&p.gene), 0);
    }

    #[test]
    fn test_single_copy_supertree() {
        // only one of the two A copies is paired
        assert_eq!(score("((A,B),(C,D));", "(((A,B),A),(C,D));"), 0);
        assert_eq!(score("((A,C),(B,D));", "(((A,B),A),(C,D));"), 2);
    }

    // Random binary tree: leaves inserted one by one on random edges.
    fn random_tree(rng: &mut StdRng, taxa: &[&str]) -> (Tree, TaxonNames) {
        let mut tree = Tree::new();
        let mut names = TaxonNames::new();
        let a = tree.add_node();
        let b = tree.add_node();
        tree.add_edge(a, b);
        names.insert(a, taxa[0].to_string());
        names.insert(b, taxa[1].to_string());
        for name in &taxa[2..] {
            let mut edges = vec![];
            for u in 0..tree.capacity() {
                for &v in tree.adjacent(u) {
                    if u < v {
                        edges.push((u, v));
                    }
                }
            }
            let &(u, v) = edges.choose(rng).unwrap();
            let x = tree.add_node();
            let y = tree.add_node();
            tree.add_edge(x, y);
            tree.spr(x, y, u, v);
            names.insert(x, name.to_string());
        }
        (tree, names)
    }

    // Non-trivial splits over the shared taxa, normalized to contain bit 0.
    fn splits(tree: &Tree, names: &TaxonNames, shared: &[&str]) -> HashSet<FixedBitSet> {
        let n = shared.len();
        let index = |v: NodeId| {
            names
                .get(&v)
                .and_then(|name| shared.iter().position(|s| s == name))
        };
        let mut result = HashSet::new();
        for u in 0..tree.capacity() {
            for &v in tree.adjacent(u) {
                let mut bits = FixedBitSet::with_capacity(n);
                for w in tree.preorder(v, Some(u)) {
                    if let Some(i) = index(w) {
                        bits.insert(i);
                    }
                }
                if !bits.contains(0) {
                    bits.toggle_range(..n);
                }
                let count = bits.count_ones(..);
                if count > 1 && count < n - 1 {
                    result.insert(bits);
                }
            }
        }
        result
    }

    #[test]
    fn test_against_splits() {
        let mut rng = StdRng::seed_from_u64(7);
        let all = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];
        for _ in 0..50 {
            let (stree, s_names) = random_tree(&mut rng, &all);

            let mut subset = all.to_vec();
            subset.shuffle(&mut rng);
            let keep = rng.gen_range(4..=all.len());
            let mut subset = subset[..keep].to_vec();
            subset.sort();
            let (gtree, g_names) = random_tree(&mut rng, &subset);

            let s_splits = splits(&stree, &s_names, &subset);
            let g_splits = splits(&gtree, &g_names, &subset);
            let expected = s_splits.symmetric_difference(&g_splits).count() as i64;

            let mut p = pair(stree, &s_names, gtree, &g_names);
            assert_eq!(rf_score(&p.stree, &mut p.gene, &p.leaves), expected);
        }
    }

    #[test]
    fn test_incremental_slides() {
        // Slide a leaf along every edge and compare with full recomputation.
        let mut rng = StdRng::seed_from_u64(11);
        let taxa = ["A", "B", "C", "D", "E", "F", "G", "H"];
        for _ in 0..20 {
            let (stree, s_names) = random_tree(&mut rng, &taxa);
            let (gtree, g_names) = random_tree(&mut rng, &taxa);
            let mut p = pair(stree, &s_names, gtree, &g_names);

            // prune leaf H with its attachment node
            let x = p.s_taxa.occurrences(7)[0];
            let y = p.stree.adjacent(x)[0];
            let rest: Vec<NodeId> = p.stree.children(y, Some(x)).collect();
            let (b, c) = (rest[0], rest[1]);

            let g_anchor = p.gene.first_paired().unwrap();
            let s_anchor = p.gene.partner(g_anchor).unwrap();
            if s_anchor == x {
                continue;
            }
            assert!(p.gene.prepare(g_anchor));
            let mut state = RfState::new(&p.stree, s_anchor, &mut p.gene, &p.leaves);
            let mut current = state.rf(&p.gene);

            let visits: Vec<_> = p.stree.dfs(c, Some(y)).collect();
            let mut par = vec![None; p.stree.capacity()];
            par[c] = Some(b);
            for visit in visits {
                let (v, Some(pv)) = (visit.node, visit.parent) else {
                    continue;
                };
                if v == c {
                    continue;
                }
                let (from, to) = match visit.direction {
                    Direction::Preorder => {
                        par[v] = Some(pv);
                        (par[pv].unwrap(), v)
                    }
                    Direction::Postorder => (v, par[pv].unwrap()),
                    Direction::Inorder => continue,
                };
                current += state.retract(&p.stree, &mut p.gene, y, pv);
                p.stree.move_subtree(from, pv, to, y);
                current += state.reattach(&p.stree, &mut p.gene, y, from, pv, to);

                assert_eq!(current, state.rf(&p.gene));
                let mut fresh = p.gene.clone();
                assert!(fresh.prepare(g_anchor));
                let full = RfState::new(&p.stree, s_anchor, &mut fresh, &p.leaves);
                assert_eq!(current, full.rf(&fresh));
                for n in p.stree.preorder(s_anchor, None) {
                    assert_eq!(state.cluster_size(n), full.cluster_size(n), "node {}", n);
                }
            }
            assert!(p.stree.is_adjacent(y, b) && p.stree.is_adjacent(y, c));
        }
    }

    fn relabel(names: &TaxonNames, map: &[(&str, &str)]) -> TaxonNames {
        names
            .iter()
            .map(|(&v, name)| {
                let to = map
                    .iter()
                    .find(|(from, _)| *from == name.as_str())
                    .map(|(_, to)| to.to_string())
                    .unwrap_or_else(|| name.clone());
                (v, to)
            })
            .collect()
    }

    #[test]
    fn test_relabel_invariant() {
        let mut rng = StdRng::seed_from_u64(23);
        let taxa = ["A", "B", "C", "D", "E", "F", "G"];
        for _ in 0..20 {
            let (stree, s_names) = random_tree(&mut rng, &taxa);
            let (gtree, g_names) = random_tree(&mut rng, &taxa);
            let mut p = pair(stree.clone(), &s_names, gtree.clone(), &g_names);
            let expected = rf_score(&p.stree, &mut p.gene, &p.leaves);

            for _ in 0..3 {
                // the same permutation of names on both trees
                let mut shuffled = taxa.to_vec();
                shuffled.shuffle(&mut rng);
                let map = taxa.iter().copied().zip(shuffled).collect::<Vec<_>>();
                let mut q = pair(
                    stree.clone(),
                    &relabel(&s_names, &map),
                    gtree.clone(),
                    &relabel(&g_names, &map),
                );
                assert_eq!(rf_score(&q.stree, &mut q.gene, &q.leaves), expected);
            }
        }
    }

    #[test]
    fn test_rescore_unchanged() {
        let mut rng = StdRng::seed_from_u64(29);
        let taxa = ["A", "B", "C", "D", "E", "F", "G", "H"];
        for _ in 0..20 {
            let (stree, s_names) = random_tree(&mut rng, &taxa);
            let (gtree, g_names) = random_tree(&mut rng, &taxa);
            let mut p = pair(stree, &s_names, gtree, &g_names);

            let first = rf_score(&p.stree, &mut p.gene, &p.leaves);
            let gene_before = p.gene.tree.clone();
            let second = rf_score(&p.stree, &mut p.gene, &p.leaves);
            assert_eq!(first, second);
            assert_eq!(p.gene.tree, gene_before);
        }
    }
}
