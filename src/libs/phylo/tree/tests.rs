use super::*;

//    0
//   / \
//  1   2
// / \
//3   4
fn small_rooted() -> Tree {
    let mut tree = Tree::new();
    for _ in 0..5 {
        tree.add_node();
    }
    tree.add_edge(0, 1);
    tree.add_edge(0, 2);
    tree.add_edge(1, 3);
    tree.add_edge(1, 4);
    tree.set_root(Some(0));
    tree
}

// A   C
//  4-5
// B   D
fn quartet() -> Tree {
    let mut tree = Tree::new();
    for _ in 0..6 {
        tree.add_node();
    }
    tree.add_edge(0, 4);
    tree.add_edge(1, 4);
    tree.add_edge(2, 5);
    tree.add_edge(3, 5);
    tree.add_edge(4, 5);
    tree
}

fn sorted(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut adj = tree.adjacent(id).to_vec();
    adj.sort();
    adj
}

#[test]
fn test_tree_traversals() {
    let tree = small_rooted();

    assert_eq!(tree.preorder(0, None), vec![0, 1, 3, 4, 2]);
    assert_eq!(tree.postorder(0, None), vec![3, 4, 1, 2, 0]);

    // the same storage viewed from node 1
    assert_eq!(tree.preorder(1, None), vec![1, 0, 2, 3, 4]);
    // a subtree
    assert_eq!(tree.preorder(1, Some(0)), vec![1, 3, 4]);
}

#[test]
fn test_dfs_events() {
    let tree = small_rooted();
    let events: Vec<(NodeId, Direction)> = tree
        .dfs(0, None)
        .map(|v| (v.node, v.direction))
        .collect();

    use Direction::*;
    assert_eq!(
        events,
        vec![
            (0, Preorder),
            (1, Preorder),
            (3, Preorder),
            (3, Inorder),
            (3, Postorder),
            (1, Inorder),
            (4, Preorder),
            (4, Inorder),
            (4, Postorder),
            (1, Postorder),
            (0, Inorder),
            (2, Preorder),
            (2, Inorder),
            (2, Postorder),
            (0, Postorder),
        ]
    );

    let depths: Vec<usize> = tree
        .dfs(0, None)
        .filter(|v| v.direction == Preorder)
        .map(|v| v.depth)
        .collect();
    assert_eq!(depths, vec![0, 1, 2, 2, 1]);

    let parents: Vec<Option<NodeId>> = tree
        .dfs(0, None)
        .filter(|v| v.direction == Preorder)
        .map(|v| v.parent)
        .collect();
    assert_eq!(parents, vec![None, Some(0), Some(1), Some(1), Some(0)]);
}

#[test]
fn test_dfs_skip_children() {
    let tree = small_rooted();
    let mut dfs = tree.dfs(0, None);
    let mut pre = vec![];
    while let Some(visit) = dfs.next() {
        if visit.direction == Direction::Preorder {
            pre.push(visit.node);
            if visit.node == 1 {
                dfs.skip_children();
            }
        }
    }
    assert_eq!(pre, vec![0, 1, 2]);
}

#[test]
fn test_euler_tour() {
    let tree = small_rooted();
    let tour: Vec<(NodeId, usize)> = tree.euler_tour().collect();
    assert_eq!(
        tour,
        vec![
            (0, 0),
            (1, 1),
            (3, 2),
            (1, 1),
            (4, 2),
            (1, 1),
            (0, 0),
            (2, 1),
            (0, 0)
        ]
    );

    let unrooted = quartet();
    assert_eq!(unrooted.euler_tour().count(), 0);
}

#[test]
fn test_edges() {
    let mut tree = quartet();
    assert_eq!(tree.degree(4), 3);
    assert!(tree.is_adjacent(4, 5));
    assert_eq!(tree.get_leaves(), vec![0, 1, 2, 3]);
    assert_eq!(tree.get_internals(), vec![4, 5]);

    assert!(tree.remove_edge(4, 5));
    assert!(!tree.remove_edge(4, 5));
    assert_eq!(tree.adjacent(4), &[0, 1]);
}

#[test]
#[should_panic(expected = "already adjacent")]
fn test_duplicated_edge() {
    let mut tree = quartet();
    tree.add_edge(5, 4);
}

#[test]
fn test_root_by() {
    let mut tree = quartet();

    let r = tree.root_by_leaf(0).unwrap();
    assert_eq!(r, 6);
    assert_eq!(tree.get_root(), Some(6));
    assert_eq!(sorted(&tree, 6), vec![0, 4]);
    assert!(!tree.is_adjacent(0, 4));

    // the degree-2 root is lifted and reused
    let r = tree.root_by(5, 2);
    assert_eq!(r, 6);
    assert_eq!(tree.capacity(), 7);
    assert!(tree.is_adjacent(0, 4));
    assert_eq!(sorted(&tree, 6), vec![2, 5]);

    // nothing to do on an edge touching the root
    assert_eq!(tree.root_by(6, 2), 6);
    assert_eq!(sorted(&tree, 6), vec![2, 5]);

    tree.unroot();
    assert_eq!(tree.get_root(), None);
    assert!(tree.is_adjacent(5, 2));
    assert!(tree.get_node(6).deleted);
    assert_eq!(tree.len(), 6);

    assert!(tree.root_by_leaf(4).is_err());
}

#[test]
fn test_unroot() {
    // a degree-2 root is spliced out
    let mut tree = small_rooted();
    tree.unroot();
    assert_eq!(tree.get_root(), None);
    assert!(tree.get_node(0).deleted);
    assert_eq!(sorted(&tree, 1), vec![2, 3, 4]);

    // any other root stays as an ordinary node
    let mut tree = quartet();
    tree.set_root(Some(4));
    tree.unroot();
    assert_eq!(tree.get_root(), None);
    assert_eq!(tree, quartet());
}

#[test]
fn test_root_by_non_binary_root() {
    // root of degree 3 stays as an ordinary node
    let mut tree = quartet();
    tree.set_root(Some(4));
    let r = tree.root_by(5, 3);
    assert_eq!(r, 6);
    assert_eq!(tree.degree(4), 3);
    assert_eq!(sorted(&tree, 6), vec![3, 5]);
}

#[test]
fn test_spr() {
    let mut tree = quartet();
    // AB|CD -> AC|BD
    assert!(tree.spr(0, 4, 5, 2));
    assert_eq!(sorted(&tree, 4), vec![0, 2, 5]);
    assert_eq!(sorted(&tree, 5), vec![1, 3, 4]);

    // pn on the target edge
    assert!(!tree.spr(0, 4, 4, 5));
    assert_eq!(sorted(&tree, 4), vec![0, 2, 5]);
}

#[test]
fn test_spr_to_edge() {
    let mut tree = quartet();
    // a fresh attachment node with a single leaf below it
    let x = tree.add_node();
    let y = tree.add_node();
    tree.add_edge(x, y);

    assert!(tree.spr_to_edge(x, y, 2));
    assert_eq!(sorted(&tree, y), vec![2, 5, x]);
    assert_eq!(sorted(&tree, 5), vec![3, 4, y]);

    // hubs never move
    let (hub, _) = tree.extend_leaf(0, 2);
    assert!(!tree.spr_to_edge(0, hub, 1));
}

#[test]
fn test_spr_to_root() {
    // r(p(u, a), b)
    let mut tree = Tree::new();
    for _ in 0..5 {
        tree.add_node();
    }
    let (r, p, u, a, b) = (0, 1, 2, 3, 4);
    tree.add_edge(r, p);
    tree.add_edge(r, b);
    tree.add_edge(p, u);
    tree.add_edge(p, a);
    tree.set_root(Some(r));
    let before = tree.clone();

    assert!(!tree.spr_to_root(r, p));
    assert!(tree.spr_to_root(u, p));
    assert_eq!(tree.get_root(), Some(p));
    assert_eq!(sorted(&tree, p), vec![r, u]);
    assert_eq!(sorted(&tree, r), vec![p, a, b]);
    let mut below = tree.children(r, Some(p)).collect::<Vec<_>>();
    below.sort();
    assert_eq!(below, vec![a, b]);

    assert!(tree.spr_from_root(u, r, r, a));
    assert_eq!(tree.get_root(), Some(r));
    for id in 0..5 {
        assert_eq!(sorted(&tree, id), sorted(&before, id));
    }
}

#[test]
fn test_move_subtree() {
    // a - y - b - c, x below y, d below b
    let mut tree = Tree::new();
    for _ in 0..6 {
        tree.add_node();
    }
    let (a, y, b, c, x, d) = (0, 1, 2, 3, 4, 5);
    tree.add_edge(a, y);
    tree.add_edge(y, b);
    tree.add_edge(b, c);
    tree.add_edge(y, x);
    tree.add_edge(b, d);

    tree.move_subtree(a, b, c, y);
    assert!(tree.is_adjacent(a, b));
    assert!(tree.is_adjacent(c, y));
    assert!(!tree.is_adjacent(a, y));
    assert!(!tree.is_adjacent(b, c));
    assert_eq!(sorted(&tree, y), vec![b, c, x]);
    assert_eq!(sorted(&tree, b), vec![a, y, d]);

    // and back again
    tree.move_subtree(c, b, a, y);
    assert_eq!(sorted(&tree, y), vec![a, b, x]);
    assert_eq!(sorted(&tree, b), vec![y, c, d]);
}

#[test]
fn test_hubs() {
    let mut tree = quartet();
    let (hub, extra) = tree.extend_leaf(0, 3);
    assert!(tree.is_fake(hub));
    assert_eq!(extra.len(), 2);
    assert_eq!(tree.degree(hub), 4);
    assert!(tree.is_adjacent(hub, 4));
    assert_eq!(tree.get_leaves().len(), 6);

    assert!(tree.contract_hub(4, 1, &[]).is_err());
    tree.contract_hub(hub, 0, &extra).unwrap();
    assert!(tree.is_adjacent(0, 4));
    assert!(tree.get_node(hub).deleted);
    assert_eq!(tree.get_leaves(), vec![0, 1, 2, 3]);
}

#[test]
fn test_trim_leaf() {
    let mut tree = quartet();
    tree.trim_leaf(0).unwrap();
    assert!(tree.get_node(4).deleted);
    assert!(tree.is_adjacent(1, 5));
    assert_eq!(tree.get_leaves(), vec![1, 2, 3]);
    assert!(tree.trim_leaf(5).is_err());
}

#[test]
fn test_is_binary() {
    let mut tree = quartet();
    assert!(tree.is_binary());
    tree.root_by_leaf(0).unwrap();
    assert!(tree.is_binary());

    let mut star = Tree::new();
    for _ in 0..5 {
        star.add_node();
    }
    for i in 1..5 {
        star.add_edge(0, i);
    }
    assert!(!star.is_binary());
}
