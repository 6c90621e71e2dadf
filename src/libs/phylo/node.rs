/// NodeId is an index into the Tree's node vector.
/// It is lightweight (Copy) and safe (no pointers).
pub type NodeId = usize;

/// Index of a constraint clade, in the order the clades were read.
pub type CladeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique identifier for the node (index in the arena)
    pub id: NodeId,

    /// Adjacent nodes. Edges are undirected; the orientation of a traversal
    /// is chosen by its starting node.
    pub adjacent: Vec<NodeId>,

    // --- Payload ---

    /// Branch length as read from the input.
    /// Only meaningful for the rooting the tree was parsed with.
    pub length: Option<f64>,

    /// Number of paired leaves below this node in the current rooting
    pub cluster_size: u32,

    /// Number of supertree nodes currently matching this node
    pub score: u32,

    /// Hub node standing for several copies of one taxon
    pub is_fake: bool,

    /// Set on the topmost node of a constraint clade
    pub constraint_id: Option<CladeId>,

    /// Set on every node lying inside a constraint clade
    pub in_clade: Option<CladeId>,

    /// Soft deletion flag.
    /// Suppressed or trimmed nodes keep their slot in the arena.
    pub deleted: bool,
}

impl Node {
    /// Create a new isolated node with a specific ID
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            adjacent: Vec::new(),
            length: None,
            cluster_size: 0,
            score: 0,
            is_fake: false,
            constraint_id: None,
            in_clade: None,
            deleted: false,
        }
    }

    pub fn degree(&self) -> usize {
        self.adjacent.len()
    }

    /// Leaves are the nodes with at most one neighbour.
    pub fn is_leaf(&self) -> bool {
        self.adjacent.len() <= 1
    }

    /// Clear the clade marks set by a previous marking pass.
    pub fn clear_marks(&mut self) {
        self.constraint_id = None;
        self.in_clade = None;
    }
}
