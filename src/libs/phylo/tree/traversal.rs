use super::Tree;
use crate::libs::phylo::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Entering a node
    Preorder,
    /// Between two children; a leaf gets exactly one
    Inorder,
    /// Leaving a node
    Postorder,
}

/// One event of a depth-first walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub node: NodeId,
    /// The node the walk came from, `None` for the starting node
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
struct Frame {
    node: NodeId,
    parent: Option<NodeId>,
    depth: usize,
    // cursor into the adjacency list
    next: usize,
    visited: usize,
    started: bool,
    between: bool,
}

impl Frame {
    fn new(node: NodeId, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            node,
            parent,
            depth,
            next: 0,
            visited: 0,
            started: false,
            between: false,
        }
    }

    fn visit(&self, direction: Direction) -> Visit {
        Visit {
            node: self.node,
            parent: self.parent,
            depth: self.depth,
            direction,
        }
    }
}

/// Depth-first walk over an undirected tree from `start`, never stepping
/// back into `parent`.
///
/// A node with k children yields one Preorder, k - 1 Inorder and one
/// Postorder event; a leaf yields all three in a row. Uses an explicit
/// stack, so deep trees do not overflow.
///
/// ```ignore
/// let mut dfs = tree.dfs(root, None);
/// while let Some(visit) = dfs.next() {
///     if tree.is_fake(visit.node) {
///         dfs.skip_children();
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Dfs<'a> {
    tree: &'a Tree,
    stack: Vec<Frame>,
    skip: bool,
}

impl<'a> Dfs<'a> {
    pub fn new(tree: &'a Tree, start: NodeId, parent: Option<NodeId>) -> Self {
        Self {
            tree,
            stack: vec![Frame::new(start, parent, 0)],
            skip: false,
        }
    }

    /// Do not descend below the node whose Preorder event was just yielded.
    pub fn skip_children(&mut self) {
        self.skip = true;
    }
}

impl Iterator for Dfs<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        let tree = self.tree;
        loop {
            let top = self.stack.last_mut()?;
            if !top.started {
                top.started = true;
                return Some(top.visit(Direction::Preorder));
            }

            let adjacent = &tree.nodes[top.node].adjacent;
            if std::mem::take(&mut self.skip) {
                top.next = adjacent.len();
            }
            while top.next < adjacent.len() && Some(adjacent[top.next]) == top.parent {
                top.next += 1;
            }

            if top.next < adjacent.len() {
                if top.visited > 0 && !top.between {
                    top.between = true;
                    return Some(top.visit(Direction::Inorder));
                }
                let child = adjacent[top.next];
                top.next += 1;
                top.visited += 1;
                top.between = false;
                let frame = Frame::new(child, Some(top.node), top.depth + 1);
                self.stack.push(frame);
            } else {
                if top.visited == 0 && !top.between {
                    top.between = true;
                    return Some(top.visit(Direction::Inorder));
                }
                let frame = self.stack.pop()?;
                return Some(frame.visit(Direction::Postorder));
            }
        }
    }
}

/// Euler tour of a rooted tree as (node, depth) pairs.
///
/// Internal nodes appear at every event, leaves once, so consecutive
/// entries are always adjacent in the tree. Unrooted trees give an empty tour.
#[derive(Debug, Clone)]
pub struct EulerTour<'a> {
    tree: &'a Tree,
    dfs: Option<Dfs<'a>>,
}

impl<'a> EulerTour<'a> {
    pub fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            dfs: tree.get_root().map(|r| Dfs::new(tree, r, None)),
        }
    }
}

impl Iterator for EulerTour<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<(NodeId, usize)> {
        let dfs = self.dfs.as_mut()?;
        loop {
            let visit = dfs.next()?;
            let is_leaf = self.tree.children(visit.node, visit.parent).next().is_none();
            if !is_leaf || visit.direction == Direction::Inorder {
                return Some((visit.node, visit.depth));
            }
        }
    }
}

/// Node IDs in preorder (Parent -> Children)
pub fn preorder(tree: &Tree, start: NodeId, parent: Option<NodeId>) -> Vec<NodeId> {
    Dfs::new(tree, start, parent)
        .filter(|v| v.direction == Direction::Preorder)
        .map(|v| v.node)
        .collect()
}

/// Node IDs in postorder (Children -> Parent)
pub fn postorder(tree: &Tree, start: NodeId, parent: Option<NodeId>) -> Vec<NodeId> {
    Dfs::new(tree, start, parent)
        .filter(|v| v.direction == Direction::Postorder)
        .map(|v| v.node)
        .collect()
}
