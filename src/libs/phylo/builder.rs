//! Minimum-RF supertree search.
//!
//! Taxa are inserted one at a time at their best-scoring edge, then the
//! tree is improved by SPR moves until no move lowers the weighted score.
//! Every candidate edge is scored incrementally: the attachment node of the
//! pruned subtree slides edge by edge along a DFS of the remaining tree and
//! only the two nodes whose children change are rescored.

use crate::libs::phylo::constraint::{clade_marks, CladeRule, CladeSet, RegraftFilter};
use crate::libs::phylo::error::{MulRfError, Result};
use crate::libs::phylo::mapping::LcaMapping;
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::parser::ParsedTree;
use crate::libs::phylo::rf::{rf_score, GeneTree, RfState, EPSILON};
use crate::libs::phylo::subtree::{SubtreeParent, SubtreeSizes};
use crate::libs::phylo::taxa::{TaxaRegistry, TaxonNames, TreeTaxaMap};
use crate::libs::phylo::tree::{Direction, Tree};
use fixedbitset::FixedBitSet;
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Cap on SPR rounds, `None` runs to a local optimum
    pub max_rounds: Option<usize>,
    /// Recompute the full score after every accepted move
    pub verify: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_rounds: None,
            verify: true,
        }
    }
}

/// Incremental scoring state of one gene tree during a search
struct Active {
    gene: usize,
    weight: f64,
    state: RfState,
    rf: i64,
}

/// Best score of a search and every regraft edge reaching it
#[derive(Debug, Clone)]
struct Candidates {
    best: f64,
    edges: Vec<(NodeId, NodeId)>,
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            best: f64::INFINITY,
            edges: Vec::new(),
        }
    }
}

impl Candidates {
    fn offer(&mut self, edge: (NodeId, NodeId), score: f64) {
        if score < self.best - EPSILON {
            self.best = score;
            self.edges.clear();
            self.edges.push(edge);
        } else if (score - self.best).abs() <= EPSILON {
            self.edges.push(edge);
        }
    }
}

/// One SPR move: prune `x` hanging from `y`, regraft `y` on `edge`
#[derive(Debug, Clone, Copy)]
struct Move {
    x: NodeId,
    y: NodeId,
    edge: (NodeId, NodeId),
}

pub struct SupertreeBuilder {
    rng: StdRng,
    options: BuildOptions,
    registry: TaxaRegistry,
    genes: Vec<GeneTree>,
    // max copies of each taxon in one gene tree
    multiplicity: Vec<usize>,
    clades: Option<CladeSet>,

    stree: Tree,
    s_taxa: TreeTaxaMap,
    // per gene: supertree leaf -> gene leaf
    leaf_maps: Vec<LcaMapping>,
    paired: Vec<usize>,
    scores: Vec<i64>,
    // leaf in no clade; orientation for clade marks and output
    reference: Option<NodeId>,
    // unlabelled reference leaf, used when every taxon is constrained
    placeholder: Option<NodeId>,

    rounds: usize,
    initial: Option<(Tree, TaxonNames)>,
}

impl SupertreeBuilder {
    /// Register the taxa of all gene trees and prepare them for scoring.
    pub fn new(trees: &[ParsedTree], rng: StdRng, options: BuildOptions) -> Result<Self> {
        if trees.is_empty() {
            return Err(MulRfError::config("No input trees found"));
        }

        let mut registry = TaxaRegistry::new();
        for parsed in trees {
            registry.insert_names(&parsed.names);
        }

        let mut multiplicity = vec![1; registry.len()];
        let mut genes = Vec::with_capacity(trees.len());
        for parsed in trees {
            let taxa = TreeTaxaMap::create(&parsed.names, &registry);
            for gid in taxa.gids() {
                multiplicity[gid] = multiplicity[gid].max(taxa.count(gid));
            }
            genes.push(GeneTree::new(
                gene_topology(&parsed.tree)?,
                taxa,
                parsed.weight,
            ));
        }
        let multi = multiplicity.iter().filter(|&&k| k > 1).count();
        info!(
            "Read {} gene trees over {} taxa ({} multi-labelled)",
            genes.len(),
            registry.len(),
            multi
        );

        let n = genes.len();
        Ok(Self {
            rng,
            options,
            registry,
            genes,
            multiplicity,
            clades: None,
            stree: Tree::new(),
            s_taxa: TreeTaxaMap::new(),
            leaf_maps: vec![LcaMapping::default(); n],
            paired: vec![0; n],
            scores: vec![0; n],
            reference: None,
            placeholder: None,
            rounds: 0,
            initial: None,
        })
    }

    /// Require the clades of `lists` to stay together.
    pub fn with_constraints(&mut self, lists: &[Vec<String>]) -> Result<()> {
        let clades = CladeSet::new(lists, &self.registry)?;
        info!("Read {} constraint clades", clades.len());
        self.clades = Some(clades);
        Ok(())
    }

    pub fn registry(&self) -> &TaxaRegistry {
        &self.registry
    }

    /// SPR rounds that improved the score
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Unweighted RF score of every gene tree
    pub fn gene_scores(&self) -> &[i64] {
        &self.scores
    }

    /// `weight * RF` of every gene tree
    pub fn weighted_scores(&self) -> Vec<f64> {
        self.genes
            .iter()
            .zip(&self.scores)
            .map(|(g, &s)| g.weight * s as f64)
            .collect()
    }

    pub fn total_score(&self) -> f64 {
        self.weighted_scores().iter().sum()
    }

    /// Use `parsed` as the species tree instead of building one.
    ///
    /// Leaves unknown to the gene trees are an error, or trimmed with a
    /// warning when `trim_unknown` is set (scoring mode, which also accepts
    /// a tree missing some taxa).
    pub fn start_from(&mut self, parsed: &ParsedTree, trim_unknown: bool) -> Result<()> {
        let mut tree = parsed.tree.clone();
        if !tree.is_binary() {
            return Err(MulRfError::config("Initial species tree is not binary"));
        }

        let mut taxa = TreeTaxaMap::new();
        let mut unknown = Vec::new();
        for leaf in tree.get_leaves() {
            let gid = parsed
                .names
                .get(&leaf)
                .and_then(|name| self.registry.gid(name));
            match gid {
                Some(gid) if taxa.count(gid) > 0 => {
                    return Err(MulRfError::config(format!(
                        "Initial species tree has taxon {} more than once",
                        self.registry.name(gid)
                    )));
                }
                Some(gid) => taxa.insert(leaf, gid),
                None if trim_unknown => {
                    let name = parsed.names.get(&leaf).map_or("<unnamed>", |s| s.as_str());
                    warn!("Species tree leaf {} is in no gene tree, trimmed", name);
                    unknown.push(leaf);
                }
                None => {
                    return Err(MulRfError::config(
                        "Some leaf of the supertree is not in any of the input trees",
                    ));
                }
            }
        }
        if taxa.unique_count() == 0 {
            return Err(MulRfError::config(
                "Species tree shares no taxa with the gene trees",
            ));
        }
        if !trim_unknown && taxa.unique_count() < self.registry.len() {
            return Err(MulRfError::config(
                "Initial species tree doesn't have all leaves",
            ));
        }

        tree.unroot();
        for leaf in unknown {
            tree.trim_leaf(leaf).map_err(MulRfError::internal)?;
        }
        tree.clear_lengths();

        let gids = taxa.gids().collect_vec();
        for gid in gids {
            let k = self.multiplicity[gid];
            if k > 1 {
                let leaf = taxa.occurrences(gid)[0];
                let (_, extra) = tree.extend_leaf(leaf, k);
                for l in extra {
                    taxa.insert(l, gid);
                }
            }
        }

        if self.clades.take().is_some() {
            warn!("Constraints doesn't work with starting species tree");
        }

        self.stree = tree;
        self.s_taxa = taxa;
        self.placeholder = None;
        self.reference = self
            .s_taxa
            .gids()
            .next()
            .and_then(|gid| self.s_taxa.occurrences(gid).first().copied());
        self.pair_all();
        self.refresh_scores();
        info!(
            "Species tree: {} leaves, RF score = {:.2}",
            self.s_taxa.leaf_count(),
            self.total_score()
        );
        Ok(())
    }

    /// Build the initial tree unless one was supplied, then refine it.
    pub fn build(&mut self) -> Result<()> {
        if self.stree.is_empty() {
            self.insert_all()?;
        }
        self.initial = Some(self.export()?);
        info!("Initial species tree: RF score = {:.2}", self.total_score());
        self.refine()
    }

    /// The tree before refinement, hubs contracted
    pub fn initial_species_tree(&self) -> Option<&(Tree, TaxonNames)> {
        self.initial.as_ref()
    }

    /// The current species tree with hubs contracted, rooted on the
    /// pendant edge of the reference leaf.
    pub fn species_tree(&self) -> Result<(Tree, TaxonNames)> {
        self.export()
    }

    // --- Scores ---

    fn pair_all(&mut self) {
        for (gi, gene) in self.genes.iter_mut().enumerate() {
            let mut leaves = LcaMapping::new(self.stree.capacity());
            leaves.update_leaves(&self.s_taxa, &gene.taxa);
            self.paired[gi] = gene.sync_partners(&leaves, self.s_taxa.nodes());
            self.leaf_maps[gi] = leaves;
        }
    }

    fn pair_taxon(&mut self, gid: usize) {
        for (gi, gene) in self.genes.iter_mut().enumerate() {
            self.leaf_maps[gi].update_taxon(gid, &self.s_taxa, &gene.taxa);
            self.paired[gi] = gene.sync_partners(&self.leaf_maps[gi], self.s_taxa.nodes());
        }
    }

    fn refresh_scores(&mut self) {
        for (gi, gene) in self.genes.iter_mut().enumerate() {
            self.scores[gi] = rf_score(&self.stree, gene, &self.leaf_maps[gi]);
        }
    }

    /// Full recompute after a move predicted to score `predicted`.
    fn refresh_and_verify(&mut self, predicted: f64) -> Result<()> {
        self.refresh_scores();
        let total = self.total_score();
        if self.options.verify && (total - predicted).abs() > EPSILON {
            return Err(MulRfError::internal(format!(
                "incremental score {:.5} differs from the full score {:.5}",
                predicted, total
            )));
        }
        Ok(())
    }

    // --- Clades ---

    fn reference(&self) -> Result<NodeId> {
        self.reference
            .ok_or_else(|| MulRfError::internal("the species tree has no reference leaf"))
    }

    fn mark_clades(&mut self) -> Result<()> {
        let reference = self.reference()?;
        if let Some(clades) = &self.clades {
            clades.mark(&mut self.stree, &self.s_taxa, reference);
        }
        Ok(())
    }

    fn check_clades(&mut self) -> Result<()> {
        self.mark_clades()?;
        let reference = self.reference()?;
        if let Some(clades) = &self.clades {
            let broken = clades.broken(&self.stree, &self.s_taxa, reference);
            if let Some(c) = broken.first() {
                return Err(MulRfError::internal(format!(
                    "constraint clade {} was split",
                    c + 1
                )));
            }
        }
        Ok(())
    }

    /// Pruning the subtree below `x`: a proper part of a clade stays in it,
    /// anything else stays out of every clade.
    fn rule_below(&self, x: NodeId) -> CladeRule {
        let node = self.stree.get_node(x);
        match node.in_clade {
            Some(c) if node.constraint_id != Some(c) => CladeRule::Within(c),
            _ => CladeRule::Outside,
        }
    }

    /// Pruning the side above `y`: when everything below `y` is one clade
    /// the rest may go anywhere in it.
    fn rule_above(&self, y: NodeId) -> CladeRule {
        if self.stree.get_node(y).in_clade.is_some() {
            CladeRule::Anywhere
        } else {
            CladeRule::Outside
        }
    }

    // --- Phase 1 ---

    /// A leaf for `gid`, or a hub of leaves when it is multi-labelled.
    fn add_unit(&mut self, gid: usize) -> NodeId {
        let leaf = self.stree.add_node();
        self.s_taxa.insert(leaf, gid);
        let k = self.multiplicity[gid];
        if k > 1 {
            let (hub, extra) = self.stree.extend_leaf(leaf, k);
            for l in extra {
                self.s_taxa.insert(l, gid);
            }
            hub
        } else {
            leaf
        }
    }

    fn insert_all(&mut self) -> Result<()> {
        let mut order = (0..self.registry.len()).collect_vec();
        order.shuffle(&mut self.rng);
        // start from a free taxon; without one an unlabelled leaf stands in
        let free = match &self.clades {
            Some(clades) => clades.first_free(&order),
            None => order.first().copied(),
        };
        if let Some(pos) = free.and_then(|f| order.iter().position(|&g| g == f)) {
            order.swap(0, pos);
        }

        let first = self.add_unit(order[0]);
        self.reference = self.s_taxa.occurrences(order[0]).first().copied();
        if order.len() > 1 {
            let second = self.add_unit(order[1]);
            self.stree.add_edge(first, second);
            if free.is_none() {
                let leaf = self.stree.add_node();
                let joint = self.stree.add_node();
                self.stree.add_edge(leaf, joint);
                self.stree.spr(leaf, joint, first, second);
                self.placeholder = Some(leaf);
                self.reference = Some(leaf);
                debug!("Every taxon is constrained, added an unlabelled reference leaf");
            }
            self.pair_all();
            for (i, &gid) in order.iter().enumerate().skip(2) {
                self.insert_taxon(gid, first, second)?;
                debug!(
                    "Inserted {} ({}/{}): score = {:.2}",
                    self.registry.name(gid),
                    i + 1,
                    order.len(),
                    self.total_score()
                );
            }
        } else {
            self.pair_all();
        }
        self.refresh_scores();
        self.check_clades()?;
        info!(
            "Inserted {} taxa: {} nodes in the species tree",
            order.len(),
            self.stree.len()
        );
        Ok(())
    }

    fn insert_taxon(&mut self, gid: usize, first: NodeId, second: NodeId) -> Result<()> {
        let reference = self.reference()?;
        self.mark_clades()?;
        let parents = SubtreeParent::new(&self.stree, reference, None);
        let marks = clade_marks(&self.stree);
        // join the members already placed, or start the clade outside others
        let clade = self
            .clades
            .as_ref()
            .and_then(|cs| cs.clade_of(gid).map(|c| (c, cs.members(c))));
        let rule = match clade {
            Some((c, members)) if members.iter().any(|&g| self.s_taxa.count(g) > 0) => {
                CladeRule::Within(c)
            }
            _ => CladeRule::Outside,
        };
        let filter = self
            .clades
            .as_ref()
            .map(|_| RegraftFilter::new(rule, &parents, &marks));

        let x = self.add_unit(gid);
        let y = self.stree.add_node();
        self.stree.add_edge(x, y);
        if !self.stree.spr_to_edge(x, y, first) && !self.stree.spr_to_edge(x, y, second) {
            return Err(MulRfError::internal(format!(
                "no edge to insert taxon {}",
                self.registry.name(gid)
            )));
        }
        self.pair_taxon(gid);
        self.refresh_scores();

        let found = self.search(x, y, filter.as_ref(), true)?;
        let Some(&edge) = found.edges.choose(&mut self.rng) else {
            return Err(MulRfError::internal(format!(
                "no allowed edge for taxon {}",
                self.registry.name(gid)
            )));
        };
        self.regraft(Move { x, y, edge })?;
        self.refresh_and_verify(found.best)?;

        self.settle_sibling(x, y)
    }

    /// Once `x` sits at `y`, try moving its sibling subtree elsewhere.
    fn settle_sibling(&mut self, x: NodeId, y: NodeId) -> Result<()> {
        let reference = self.reference()?;
        self.mark_clades()?;
        let parents = SubtreeParent::new(&self.stree, reference, None);
        let Some(py) = parents.parent(y) else {
            return Ok(());
        };
        let Some(sibling) = self.stree.children(y, Some(py)).find(|&n| n != x) else {
            return Ok(());
        };
        let sizes = SubtreeSizes::new(&self.stree, reference, None);
        if sizes.subtree_size(reference) < sizes.subtree_size(sibling) + 3 {
            return Ok(());
        }

        let marks = clade_marks(&self.stree);
        let rule = self.rule_below(sibling);
        let filter = self
            .clades
            .as_ref()
            .map(|_| RegraftFilter::new(rule, &parents, &marks));
        let current = self.total_score();
        let found = self.search(sibling, y, filter.as_ref(), false)?;
        if found.best < current - EPSILON {
            if let Some(&edge) = found.edges.choose(&mut self.rng) {
                debug!("Moved sibling {}: {:.2} -> {:.2}", sibling, current, found.best);
                self.regraft(Move {
                    x: sibling,
                    y,
                    edge,
                })?;
                self.refresh_and_verify(found.best)?;
            }
        }
        Ok(())
    }

    // --- Phase 2 ---

    /// SPR hill climbing: each round applies one best move of the whole
    /// neighbourhood, ties broken at random.
    pub fn refine(&mut self) -> Result<()> {
        let reference = self.reference()?;
        loop {
            let current = self.total_score();
            if current <= EPSILON {
                break;
            }
            if let Some(max) = self.options.max_rounds {
                if self.rounds >= max {
                    info!("Stopped after {} SPR rounds", max);
                    break;
                }
            }

            self.mark_clades()?;
            let parents = SubtreeParent::new(&self.stree, reference, None);
            let sizes = SubtreeSizes::new(&self.stree, reference, None);
            let marks = clade_marks(&self.stree);
            let leaves = sizes.subtree_size(reference);

            let mut edges = Vec::new();
            for v in self.stree.preorder(reference, None) {
                if let Some(w) = parents.parent(v) {
                    if !self.is_hub_edge(v, w) {
                        edges.push((v, w));
                    }
                }
            }
            edges.shuffle(&mut self.rng);
            let above_first: bool = self.rng.gen();

            let mut best = current;
            let mut moves: Vec<Move> = Vec::new();
            for pass in 0..2 {
                let above = (pass == 0) == above_first;
                for &(v, w) in &edges {
                    // prune v below w, or everything above v
                    let (x, y, rest) = if above {
                        (w, v, sizes.subtree_size(v))
                    } else {
                        (v, w, leaves - sizes.subtree_size(v))
                    };
                    if self.stree.is_fake(y) || self.stree.degree(y) != 3 || rest < 3 {
                        continue;
                    }

                    let rule = if above {
                        self.rule_above(y)
                    } else {
                        self.rule_below(x)
                    };
                    let filter = self
                        .clades
                        .as_ref()
                        .map(|_| RegraftFilter::new(rule, &parents, &marks));
                    let found = self.search(x, y, filter.as_ref(), false)?;

                    if found.best < best - EPSILON {
                        best = found.best;
                        moves.clear();
                    } else if !(found.best < current - EPSILON
                        && (found.best - best).abs() <= EPSILON)
                    {
                        continue;
                    }
                    moves.extend(found.edges.iter().map(|&edge| Move { x, y, edge }));
                }
            }

            let Some(&mv) = moves.choose(&mut self.rng) else {
                info!("No improving SPR move");
                break;
            };
            debug!(
                "SPR: prune {} at {}, regraft on ({}, {})",
                mv.x, mv.y, mv.edge.0, mv.edge.1
            );
            self.regraft(mv)?;
            self.rounds += 1;
            self.refresh_and_verify(best)?;
            self.check_clades()?;
            info!(
                "SPR round {}: RF score = {:.2}",
                self.rounds,
                self.total_score()
            );
        }
        Ok(())
    }

    // --- Search ---

    fn is_hub_edge(&self, u: NodeId, v: NodeId) -> bool {
        (self.stree.is_fake(u) && self.stree.is_leaf(v))
            || (self.stree.is_fake(v) && self.stree.is_leaf(u))
    }

    fn regraft(&mut self, mv: Move) -> Result<()> {
        let (u, v) = mv.edge;
        if self.stree.is_adjacent(mv.y, u) && self.stree.is_adjacent(mv.y, v) {
            return Ok(());
        }
        if !self.stree.spr(mv.x, mv.y, u, v) {
            return Err(MulRfError::internal(format!(
                "cannot regraft {} on ({}, {})",
                mv.x, u, v
            )));
        }
        Ok(())
    }

    /// Slide `y` (carrying `x`) from edge (a, q) to edge (q, b), keeping the
    /// scores of the affected genes current.
    fn slide(&mut self, active: &mut [Active], y: NodeId, a: NodeId, q: NodeId, b: NodeId) {
        for act in active.iter_mut() {
            act.rf += act
                .state
                .retract(&self.stree, &mut self.genes[act.gene], y, q);
        }
        self.stree.move_subtree(a, q, b, y);
        for act in active.iter_mut() {
            act.rf += act
                .state
                .reattach(&self.stree, &mut self.genes[act.gene], y, a, q, b);
        }
    }

    /// Score every edge of the tree left after pruning `x` from `y`.
    ///
    /// `y` must join `x` to exactly two other neighbours; the edge they form
    /// once `y` is gone is a candidate only with `include_start`. The tree is
    /// back in its starting topology on return.
    fn search(
        &mut self,
        x: NodeId,
        y: NodeId,
        filter: Option<&RegraftFilter>,
        include_start: bool,
    ) -> Result<Candidates> {
        let rest = self.stree.children(y, Some(x)).collect_vec();
        let &[b, c] = rest.as_slice() else {
            return Err(MulRfError::internal(format!(
                "attachment node {} is not binary",
                y
            )));
        };
        let sides = [
            (c, b, self.stree.dfs(c, Some(y)).collect_vec()),
            (b, c, self.stree.dfs(b, Some(y)).collect_vec()),
        ];

        let mut in_rest = FixedBitSet::with_capacity(self.stree.capacity());
        let mut rest_leaves = Vec::new();
        for (_, _, visits) in &sides {
            for visit in visits {
                if visit.direction == Direction::Preorder && self.stree.is_leaf(visit.node) {
                    in_rest.insert(visit.node);
                    rest_leaves.push(visit.node);
                }
            }
        }

        // genes with paired leaves on both sides move with `y`
        let mut fixed = 0.0;
        let mut active = Vec::new();
        for (gi, gene) in self.genes.iter_mut().enumerate() {
            let leaves = &self.leaf_maps[gi];
            let in_r = rest_leaves
                .iter()
                .filter(|&&l| leaves.get(l).is_some())
                .count();
            if in_r == 0 || in_r >= self.paired[gi] {
                fixed += gene.weight * self.scores[gi] as f64;
                continue;
            }

            let s_anchor = gene
                .anchor()
                .and_then(|a| gene.partner(a))
                .filter(|&s| in_rest.contains(s))
                .or_else(|| {
                    rest_leaves
                        .iter()
                        .copied()
                        .find(|&l| leaves.get(l).is_some())
                });
            let Some((s_anchor, g_anchor)) =
                s_anchor.and_then(|s| leaves.get(s).map(|g| (s, g)))
            else {
                return Err(MulRfError::internal("no paired leaf to anchor a gene tree"));
            };
            if !gene.prepare(g_anchor) {
                return Err(MulRfError::internal(format!(
                    "cannot root gene tree {} at leaf {}",
                    gi + 1,
                    g_anchor
                )));
            }
            let state = RfState::new(&self.stree, s_anchor, gene, leaves);
            let rf = state.rf(gene);
            active.push(Active {
                gene: gi,
                weight: gene.weight,
                state,
                rf,
            });
        }
        let total = |active: &[Active]| {
            fixed
                + active
                    .iter()
                    .map(|a| a.weight * a.rf as f64)
                    .sum::<f64>()
        };
        let allowed = |u: NodeId, v: NodeId| filter.map_or(true, |f| f.allows(u, v));

        let mut found = Candidates::default();
        if include_start && allowed(b, c) {
            found.offer((b, c), total(&active));
        }

        for (start, far, visits) in &sides {
            let mut par = vec![None; self.stree.capacity()];
            par[*start] = Some(*far);
            for visit in visits {
                let (v, Some(pv)) = (visit.node, visit.parent) else {
                    continue;
                };
                if v == *start || (self.stree.is_fake(pv) && self.stree.is_leaf(v)) {
                    continue;
                }
                let Some(above) = par[pv] else {
                    return Err(MulRfError::internal(format!("node {} was not entered", pv)));
                };
                match visit.direction {
                    Direction::Preorder => {
                        par[v] = Some(pv);
                        self.slide(&mut active, y, above, pv, v);
                        if allowed(pv, v) {
                            found.offer((pv, v), total(&active));
                        }
                    }
                    Direction::Postorder => self.slide(&mut active, y, v, pv, above),
                    Direction::Inorder => {}
                }
            }
        }
        Ok(found)
    }

    // --- Output ---

    fn export(&self) -> Result<(Tree, TaxonNames)> {
        let mut tree = self.stree.clone();
        if let Some(leaf) = self.placeholder {
            tree.trim_leaf(leaf).map_err(MulRfError::internal)?;
        }
        let mut names = TaxonNames::new();
        for gid in self.s_taxa.gids() {
            let occurrences = self.s_taxa.occurrences(gid);
            let Some((&keep, dropped)) = occurrences.split_first() else {
                continue;
            };
            if !dropped.is_empty() {
                let hub = tree
                    .adjacent(keep)
                    .iter()
                    .copied()
                    .find(|&h| tree.is_fake(h))
                    .ok_or_else(|| {
                        MulRfError::internal(format!("leaf {} is not in a hub", keep))
                    })?;
                tree.contract_hub(hub, keep, dropped)
                    .map_err(MulRfError::internal)?;
            }
            names.insert(keep, self.registry.name(gid).to_string());
        }

        let root = self
            .reference
            .filter(|r| names.contains_key(r))
            .or_else(|| names.keys().next().copied());
        if let Some(r) = root {
            if tree.degree(r) == 1 {
                tree.root_by_leaf(r).map_err(MulRfError::internal)?;
            } else {
                tree.set_root(Some(r));
            }
        }
        Ok((tree, names))
    }
}

/// Unrooted topology of a gene tree, without degree-2 nodes.
fn gene_topology(parsed: &Tree) -> Result<Tree> {
    let mut tree = parsed.clone();
    tree.unroot();
    for v in 0..tree.capacity() {
        if !tree.get_node(v).deleted && tree.degree(v) == 2 {
            tree.suppress(v).map_err(MulRfError::internal)?;
        }
    }
    Ok(tree)
}
