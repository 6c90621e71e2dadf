use crate::libs::phylo::error::{MulRfError, Result};
use crate::libs::phylo::node::{CladeId, NodeId};
use crate::libs::phylo::subtree::{SubtreeInfoRooted, SubtreeParent, SubtreeSizes};
use crate::libs::phylo::taxa::{TaxaRegistry, TreeTaxaMap};
use crate::libs::phylo::tree::{Direction, Tree};
use fixedbitset::FixedBitSet;

/// Disjoint sets of taxa that must stay together as clades.
#[derive(Debug, Clone, Default)]
pub struct CladeSet {
    // by global taxon id
    clade_of: Vec<Option<CladeId>>,
    members: Vec<Vec<usize>>,
}

/// Where a subtree may be regrafted without breaking a clade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CladeRule {
    /// Any edge
    Anywhere,
    /// The subtree belongs to a clade that still has members elsewhere:
    /// only edges whose lower end lies in that clade
    Within(CladeId),
    /// Edges not inside any clade (boundary edges above a clade root are fine)
    Outside,
}

impl CladeRule {
    pub fn allows(&self, lower: Option<CladeId>, upper: Option<CladeId>) -> bool {
        match *self {
            CladeRule::Anywhere => true,
            CladeRule::Within(c) => lower == Some(c),
            CladeRule::Outside => upper.is_none(),
        }
    }
}

/// A [`CladeRule`] bound to the clade marks and the orientation (towards
/// the reference leaf) taken before a search starts.
#[derive(Debug, Clone, Copy)]
pub struct RegraftFilter<'a> {
    pub rule: CladeRule,
    parents: &'a SubtreeParent,
    marks: &'a [Option<CladeId>],
}

impl<'a> RegraftFilter<'a> {
    pub fn new(rule: CladeRule, parents: &'a SubtreeParent, marks: &'a [Option<CladeId>]) -> Self {
        Self {
            rule,
            parents,
            marks,
        }
    }

    /// Whether edge (u, v) may receive the subtree. The lower endpoint is
    /// the one whose parent is the other.
    pub fn allows(&self, u: NodeId, v: NodeId) -> bool {
        let (lower, upper) = if self.parents.parent(u) == Some(v) {
            (u, v)
        } else {
            (v, u)
        };
        let mark = |n: NodeId| self.marks.get(n).copied().flatten();
        self.rule.allows(mark(lower), mark(upper))
    }
}

/// The `in_clade` mark of every node.
pub fn clade_marks(tree: &Tree) -> Vec<Option<CladeId>> {
    (0..tree.capacity())
        .map(|v| tree.get_node(v).in_clade)
        .collect()
}

impl CladeSet {
    /// Validate clade lists against the input taxa.
    pub fn new(lists: &[Vec<String>], registry: &TaxaRegistry) -> Result<Self> {
        if lists.is_empty() {
            return Err(MulRfError::config("No constraints found"));
        }

        let mut clade_of = vec![None; registry.len()];
        let mut seen = FixedBitSet::with_capacity(registry.len());
        let mut members = Vec::with_capacity(lists.len());
        for (i, list) in lists.iter().enumerate() {
            if list.len() <= 1 {
                return Err(MulRfError::config("Too small constraint!"));
            }
            let mut gids = Vec::with_capacity(list.len());
            for name in list {
                let gid = registry.gid(name).ok_or_else(|| {
                    MulRfError::config(format!("Constraints error, unique taxa: {}", name))
                })?;
                if seen.contains(gid) {
                    return Err(MulRfError::config("Constraints error, overlap!"));
                }
                seen.insert(gid);
                clade_of[gid] = Some(i);
                gids.push(gid);
            }
            members.push(gids);
        }

        Ok(Self { clade_of, members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clade_of(&self, gid: usize) -> Option<CladeId> {
        self.clade_of.get(gid).copied().flatten()
    }

    pub fn members(&self, clade: CladeId) -> &[usize] {
        &self.members[clade]
    }

    /// First taxon in no clade
    pub fn first_free<'a>(&self, gids: impl IntoIterator<Item = &'a usize>) -> Option<usize> {
        gids.into_iter().copied().find(|&g| self.clade_of(g).is_none())
    }

    /// Set `in_clade` and `constraint_id` on every node, viewing the tree from
    /// `reference`, a leaf that is in no clade or carries no taxon at all.
    ///
    /// A node lies in clade C when every labelled leaf below it belongs to C;
    /// the topmost such node carries `constraint_id = C`.
    pub fn mark(&self, tree: &mut Tree, taxa: &TreeTaxaMap, reference: NodeId) {
        #[derive(Clone, Copy, PartialEq)]
        enum Purity {
            Empty,
            Pure(CladeId),
            Mixed,
        }

        let mut purity = vec![Purity::Empty; tree.capacity()];
        let mut parents = vec![None; tree.capacity()];
        let visits: Vec<_> = tree
            .dfs(reference, None)
            .filter(|v| v.direction == Direction::Postorder)
            .collect();
        for visit in &visits {
            let v = visit.node;
            parents[v] = visit.parent;
            purity[v] = if v == reference {
                Purity::Mixed
            } else if tree.is_leaf(v) {
                match taxa.gid(v) {
                    Some(gid) => match self.clade_of(gid) {
                        Some(c) => Purity::Pure(c),
                        None => Purity::Mixed,
                    },
                    None => Purity::Empty,
                }
            } else {
                tree.children(v, visit.parent)
                    .fold(Purity::Empty, |acc, c| match (acc, purity[c]) {
                        (Purity::Empty, p) | (p, Purity::Empty) => p,
                        (Purity::Pure(a), Purity::Pure(b)) if a == b => Purity::Pure(a),
                        _ => Purity::Mixed,
                    })
            };
        }

        for visit in &visits {
            let v = visit.node;
            let node = tree.get_node_mut(v);
            node.clear_marks();
            if let Purity::Pure(c) = purity[v] {
                node.in_clade = Some(c);
                let parent_pure = parents[v].is_some_and(|p| purity[p] == Purity::Pure(c));
                if !parent_pure {
                    node.constraint_id = Some(c);
                }
            }
        }
    }

    /// Clades (with members in the tree) that do not form a single subtree
    /// under the current marks.
    pub fn broken(&self, tree: &Tree, taxa: &TreeTaxaMap, reference: NodeId) -> Vec<CladeId> {
        let info = SubtreeInfoRooted::new(tree, reference, None);
        let sizes = SubtreeSizes::new(tree, reference, None);

        let mut roots: Vec<Vec<NodeId>> = vec![Vec::new(); self.len()];
        for v in tree.preorder(reference, None) {
            if let Some(c) = tree.get_node(v).constraint_id {
                roots[c].push(v);
            }
        }

        let mut broken = Vec::new();
        for (c, gids) in self.members.iter().enumerate() {
            let leaves: Vec<NodeId> = gids
                .iter()
                .flat_map(|&g| taxa.occurrences(g).iter().copied())
                .collect();
            if leaves.is_empty() {
                continue;
            }
            let intact = match roots[c].as_slice() {
                [root] => {
                    sizes.subtree_size(*root) == leaves.len()
                        && leaves.iter().all(|&l| info.is_contained(l, *root))
                }
                _ => false,
            };
            if !intact {
                broken.push(c);
            }
        }
        broken
    }
}
