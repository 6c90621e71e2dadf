use super::taxa::TaxonNames;
use super::tree::{Direction, Tree};

/// Serialize a tree and its leaf labels to compact NEWICK, without lengths.
///
/// A rooted tree is written from its root. An unrooted one is written from
/// its first internal node and marked with `[&U]`.
pub fn write_newick(tree: &Tree, names: &TaxonNames) -> String {
    write_newick_with(tree, names, false)
}

/// Same as [`write_newick`], with branch lengths when `lengths` is set.
pub fn write_newick_with(tree: &Tree, names: &TaxonNames, lengths: bool) -> String {
    let mut s = String::new();
    let start = match tree.get_root() {
        Some(root) => root,
        None => {
            let internals = tree.get_internals();
            match internals.first().copied().or_else(|| tree.get_leaves().first().copied()) {
                Some(id) => {
                    s.push_str("[&U]");
                    id
                }
                None => return ";".to_string(),
            }
        }
    };

    for visit in tree.dfs(start, None) {
        let has_children = tree.children(visit.node, visit.parent).next().is_some();
        match visit.direction {
            Direction::Preorder if has_children => s.push('('),
            Direction::Inorder if has_children => s.push(','),
            Direction::Postorder => {
                if has_children {
                    s.push(')');
                }
                if let Some(name) = names.get(&visit.node) {
                    s.push_str(&quote_label(name));
                }
                if lengths && visit.parent.is_some() {
                    if let Some(len) = tree.get_node(visit.node).length {
                        s.push_str(&format!(":{}", len));
                    }
                }
            }
            _ => {}
        }
    }
    s.push(';');
    s
}

fn quote_label(label: &str) -> String {
    let is_bare = !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_+.-".contains(c));
    if is_bare {
        label.to_string()
    } else {
        format!("'{}'", label.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::phylo::parser::parse_newick;

    fn round_trip(input: &str, lengths: bool) -> String {
        let parsed = parse_newick(input).unwrap();
        write_newick_with(&parsed.tree, &parsed.names, lengths)
    }

    #[test]
    fn test_to_newick() {
        assert_eq!(round_trip("((A,B),C);", false), "((A,B),C);");
        assert_eq!(round_trip("((A, B), (C,D,E));", false), "((A,B),(C,D,E));");
        assert_eq!(round_trip("A;", false), "A;");
    }

    #[test]
    fn test_to_newick_lengths() {
        assert_eq!(
            round_trip("((A:0.1,B:0.2):0.5,C:1);", true),
            "((A:0.1,B:0.2):0.5,C:1);"
        );
        // internal labels are not kept
        assert_eq!(round_trip("((A:0.1,B:0.2)90:0.5,C);", false), "((A,B),C);");
    }

    #[test]
    fn test_quote_label() {
        assert_eq!(
            round_trip("('Homo sapiens','O''Brien');", false),
            "('Homo sapiens','O''Brien');"
        );
        assert_eq!(quote_label("x.1_a+b-c"), "x.1_a+b-c");
        assert_eq!(quote_label("a,b"), "'a,b'");
    }

    #[test]
    fn test_unrooted() {
        let parsed = parse_newick("((A,B),(C,D));").unwrap();
        let mut tree = parsed.tree;
        tree.unroot();
        assert_eq!(write_newick(&tree, &parsed.names), "[&U](A,B,(C,D));");

        assert_eq!(write_newick(&Tree::new(), &TaxonNames::new()), ";");
    }
}
