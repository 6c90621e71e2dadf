use super::Tree;
use crate::libs::phylo::node::NodeId;

/// Connect `u` and `v`.
/// Self-loops and duplicated edges are programming errors.
pub fn add_edge(tree: &mut Tree, u: NodeId, v: NodeId) {
    assert_ne!(u, v, "Cannot connect node {} to itself", u);
    assert!(
        !tree.is_adjacent(u, v),
        "Nodes {} and {} are already adjacent",
        u,
        v
    );
    tree.nodes[u].adjacent.push(v);
    tree.nodes[v].adjacent.push(u);
}

/// Disconnect `u` and `v`, keeping the order of the remaining neighbours.
/// Returns false if there was no such edge.
pub fn remove_edge(tree: &mut Tree, u: NodeId, v: NodeId) -> bool {
    let Some(i) = tree.nodes[u].adjacent.iter().position(|&n| n == v) else {
        return false;
    };
    tree.nodes[u].adjacent.remove(i);
    if let Some(j) = tree.nodes[v].adjacent.iter().position(|&n| n == u) {
        tree.nodes[v].adjacent.remove(j);
    }
    true
}

fn cut(tree: &mut Tree, u: NodeId, v: NodeId) {
    assert!(remove_edge(tree, u, v), "No edge between {} and {}", u, v);
}

fn discard(tree: &mut Tree, id: NodeId) {
    let node = &mut tree.nodes[id];
    node.adjacent.clear();
    node.deleted = true;
    if tree.root == Some(id) {
        tree.root = None;
    }
}

/// Remove a degree-2 node and join its two neighbours.
pub fn suppress(tree: &mut Tree, id: NodeId) -> Result<(), String> {
    if tree.degree(id) != 2 {
        return Err(format!(
            "Node {} has degree {}, only degree-2 nodes can be suppressed",
            id,
            tree.degree(id)
        ));
    }
    splice_out(tree, id);
    Ok(())
}

// Join the two neighbours of a degree-2 node and drop it.
fn splice_out(tree: &mut Tree, id: NodeId) {
    assert_eq!(tree.degree(id), 2, "Node {} is not of degree 2", id);
    let (a, b) = (tree.nodes[id].adjacent[0], tree.nodes[id].adjacent[1]);
    cut(tree, id, a);
    cut(tree, id, b);
    add_edge(tree, a, b);
    discard(tree, id);
}

/// Place the root on edge (u, v) and return it.
///
/// A degree-2 root is lifted from its current edge and reused; any other
/// root stays where it is as an ordinary node and a new root is created.
/// When the degree-2 root already is `u` or `v` nothing changes.
pub fn root_by(tree: &mut Tree, u: NodeId, v: NodeId) -> NodeId {
    assert!(tree.is_adjacent(u, v), "No edge between {} and {}", u, v);

    let root = match tree.root {
        Some(r) if tree.degree(r) == 2 => {
            if r == u || r == v {
                return r;
            }
            let (a, b) = (tree.nodes[r].adjacent[0], tree.nodes[r].adjacent[1]);
            cut(tree, r, a);
            cut(tree, r, b);
            add_edge(tree, a, b);
            r
        }
        _ => tree.add_node(),
    };

    cut(tree, u, v);
    add_edge(tree, u, root);
    add_edge(tree, root, v);
    tree.root = Some(root);
    root
}

/// Root the tree on the pendant edge of `leaf`.
pub fn root_by_leaf(tree: &mut Tree, leaf: NodeId) -> Result<NodeId, String> {
    if tree.degree(leaf) != 1 {
        return Err(format!(
            "Node {} is not a leaf with a single neighbour",
            leaf
        ));
    }
    let nbr = tree.nodes[leaf].adjacent[0];
    Ok(root_by(tree, leaf, nbr))
}

/// Forget the root; a degree-2 root is suppressed.
pub fn unroot(tree: &mut Tree) {
    if let Some(r) = tree.root {
        if tree.degree(r) == 2 {
            splice_out(tree, r);
        }
    }
    tree.root = None;
}

/// Delete a leaf; a neighbour left with degree 2 is suppressed.
pub fn trim_leaf(tree: &mut Tree, leaf: NodeId) -> Result<(), String> {
    match tree.degree(leaf) {
        0 => {
            discard(tree, leaf);
            Ok(())
        }
        1 => {
            let nbr = tree.nodes[leaf].adjacent[0];
            cut(tree, leaf, nbr);
            discard(tree, leaf);
            match tree.degree(nbr) {
                2 if tree.root != Some(nbr) => suppress(tree, nbr),
                1 if tree.root == Some(nbr) => {
                    let child = tree.nodes[nbr].adjacent[0];
                    cut(tree, nbr, child);
                    discard(tree, nbr);
                    tree.root = Some(child);
                    Ok(())
                }
                _ => Ok(()),
            }
        }
        d => Err(format!("Node {} has degree {} and is not a leaf", leaf, d)),
    }
}

/// Replace `leaf` by a hub holding `copies` leaves: the original one plus
/// `copies - 1` new ones. Returns the hub and the new leaves.
pub fn extend_leaf(tree: &mut Tree, leaf: NodeId, copies: usize) -> (NodeId, Vec<NodeId>) {
    assert!(copies >= 2, "A hub needs at least two leaves");
    assert!(tree.degree(leaf) <= 1, "Node {} is not a leaf", leaf);

    let nbr = tree.nodes[leaf].adjacent.first().copied();
    let hub = tree.add_node();
    tree.nodes[hub].is_fake = true;
    if let Some(nbr) = nbr {
        cut(tree, leaf, nbr);
        add_edge(tree, hub, nbr);
    }

    let mut extra = Vec::with_capacity(copies - 1);
    for _ in 1..copies {
        let l = tree.add_node();
        add_edge(tree, hub, l);
        extra.push(l);
    }
    add_edge(tree, hub, leaf);

    if tree.root == Some(leaf) {
        tree.root = Some(hub);
    }
    (hub, extra)
}

/// Undo [`extend_leaf`]: drop the hub leaves in `dropped`, then suppress
/// the hub so that `keep` takes its place.
pub fn contract_hub(
    tree: &mut Tree,
    hub: NodeId,
    keep: NodeId,
    dropped: &[NodeId],
) -> Result<(), String> {
    if !tree.nodes[hub].is_fake {
        return Err(format!("Node {} is not a hub", hub));
    }
    for &d in dropped {
        if !tree.is_adjacent(hub, d) || !tree.is_leaf(d) {
            return Err(format!("Node {} is not a leaf of hub {}", d, hub));
        }
        cut(tree, hub, d);
        discard(tree, d);
    }

    let was_root = tree.root == Some(hub);
    tree.nodes[hub].is_fake = false;
    match tree.degree(hub) {
        2 => suppress(tree, hub)?,
        1 => {
            cut(tree, hub, keep);
            discard(tree, hub);
        }
        d => return Err(format!("Hub {} still has {} neighbours", hub, d)),
    }
    if was_root {
        tree.root = Some(keep);
    }
    Ok(())
}

/// Prune the subtree hanging from `pn` (containing `n`) and regraft it on
/// edge (u, v). The neighbours `pn` leaves behind are joined, through a new
/// node when there are more than two of them.
/// Returns false (and does nothing) when `pn` is `u` or `v`.
pub fn spr(tree: &mut Tree, n: NodeId, pn: NodeId, u: NodeId, v: NodeId) -> bool {
    if pn == u || pn == v {
        return false;
    }

    let others: Vec<NodeId> = tree.children(pn, Some(n)).collect();
    for &c in &others {
        cut(tree, pn, c);
    }
    match others.len() {
        0 | 1 => {}
        2 => add_edge(tree, others[0], others[1]),
        _ => {
            let joint = tree.add_node();
            for &c in &others {
                add_edge(tree, joint, c);
            }
        }
    }

    cut(tree, u, v);
    add_edge(tree, pn, u);
    add_edge(tree, pn, v);
    true
}

/// Regraft the subtree below `y` next to `u`: on the pendant edge of a
/// leaf `u`, otherwise on the edge to the first non-leaf neighbour of `u`.
/// Hubs never move this way.
pub fn spr_to_edge(tree: &mut Tree, x: NodeId, y: NodeId, u: NodeId) -> bool {
    if tree.nodes[y].is_fake {
        return false;
    }
    if tree.is_adjacent(y, u) {
        return true;
    }

    let target = if tree.is_leaf(u) {
        tree.nodes[u].adjacent.first().copied()
    } else {
        tree.nodes[u]
            .adjacent
            .iter()
            .copied()
            .find(|&t| !tree.is_leaf(t))
    };
    match target {
        Some(t) => spr(tree, x, y, u, t),
        None => false,
    }
}

/// Lift `pu` (the parent of `u`) to the top of a rooted tree so that the
/// subtree of `u` and the old root become its two children.
pub fn spr_to_root(tree: &mut Tree, u: NodeId, pu: NodeId) -> bool {
    let Some(root) = tree.root else {
        return false;
    };
    if u == root {
        return false;
    }
    if pu == root {
        return true;
    }

    let others: Vec<NodeId> = tree.children(pu, Some(u)).collect();
    for &c in &others {
        cut(tree, pu, c);
    }
    match others.len() {
        0 | 1 => {}
        2 => add_edge(tree, others[0], others[1]),
        _ => {
            let joint = tree.add_node();
            for &c in &others {
                add_edge(tree, joint, c);
            }
        }
    }

    add_edge(tree, pu, root);
    tree.root = Some(pu);
    true
}

/// Inverse of [`spr_to_root`]: detach the root from everything but `c`,
/// insert it on edge (u, v) and hand the root over to `r`.
pub fn spr_from_root(tree: &mut Tree, c: NodeId, r: NodeId, u: NodeId, v: NodeId) -> bool {
    let Some(root) = tree.root else {
        return false;
    };
    if root == u || root == v {
        return true;
    }

    let others: Vec<NodeId> = tree.children(root, Some(c)).collect();
    for w in others {
        cut(tree, root, w);
    }
    cut(tree, u, v);
    add_edge(tree, root, u);
    add_edge(tree, root, v);
    tree.root = Some(r);
    true
}

/// Slide the attachment node `y` across `b`: the edges (a, y) and (b, c)
/// become (a, b) and (c, y). `y` must be adjacent to `b`.
pub fn move_subtree(tree: &mut Tree, a: NodeId, b: NodeId, c: NodeId, y: NodeId) {
    assert!(tree.is_adjacent(b, y), "No edge between {} and {}", b, y);
    cut(tree, a, y);
    cut(tree, b, c);
    add_edge(tree, a, b);
    add_edge(tree, c, y);
}
