use super::error::{MulRfError, Result};
use super::node::NodeId;
use super::taxa::TaxonNames;
use super::tree::Tree;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, cut, map, map_res, opt, recognize},
    error::{context, ContextError, ErrorKind, FromExternalError, ParseError},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded, terminated},
    IResult, Offset, Parser,
};

// ================================================================================================
// Error Handling Structures
// ================================================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DetailedErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
}

/// A nom error that keeps every position and context it passed through,
/// innermost first.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedError<'a> {
    pub errors: Vec<(&'a str, DetailedErrorKind)>,
}

impl<'a> ParseError<&'a str> for DetailedError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a str, kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a str> for DetailedError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Context(ctx)));
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for DetailedError<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }
}

// ================================================================================================
// Intermediate Structures
// ================================================================================================

/// Recursive node built while parsing, flattened into the arena afterwards.
#[derive(Debug)]
struct ParsedNode {
    name: Option<String>,
    length: Option<f64>,
    children: Vec<ParsedNode>,
}

impl ParsedNode {
    /// Nodes are allocated in preorder; a child's first neighbour is its
    /// parent. Only leaf labels are kept, internal labels (often support
    /// values) are dropped.
    fn to_tree(self, tree: &mut Tree, names: &mut TaxonNames, parent: Option<NodeId>) -> NodeId {
        let id = tree.add_node();
        if let Some(p) = parent {
            tree.add_edge(p, id);
        }
        tree.get_node_mut(id).length = self.length;
        if self.children.is_empty() {
            if let Some(name) = self.name {
                names.insert(id, name);
            }
        }
        for child in self.children {
            child.to_tree(tree, names, Some(id));
        }
        id
    }
}

/// Bracketed metadata in front of a tree
#[derive(Debug, Clone, PartialEq)]
enum Header {
    Rooted(bool),
    Weight(f64),
    Other,
}

/// One tree read from NEWICK text.
#[derive(Debug, Clone)]
pub struct ParsedTree {
    /// Rooted at the outermost parenthesis
    pub tree: Tree,
    /// Leaf labels
    pub names: TaxonNames,
    /// From `[&WEIGHT=w]`, 1.0 when absent
    pub weight: f64,
    /// From `[&R]` or `[&U]`
    pub rooted: Option<bool>,
}

impl ParsedTree {
    fn new(root: ParsedNode, headers: Vec<Header>) -> Self {
        let mut tree = Tree::new();
        let mut names = TaxonNames::new();
        let root_id = root.to_tree(&mut tree, &mut names, None);
        tree.set_root(Some(root_id));

        let mut weight = 1.0;
        let mut rooted = None;
        for header in headers {
            match header {
                Header::Rooted(r) => rooted = Some(r),
                Header::Weight(w) => weight = w,
                Header::Other => {}
            }
        }
        Self {
            tree,
            names,
            weight,
            rooted,
        }
    }

    /// Number of labelled leaves
    pub fn leaf_count(&self) -> usize {
        self.names.len()
    }
}

// ================================================================================================
// Parsers
// ================================================================================================

// Whitespace eater
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_+.-".contains(c)
}

// Label: bare [A-Za-z0-9_+.-]+, or quoted with ' or ", a doubled quote
// standing for itself.
fn parse_label(input: &str) -> IResult<&str, String, DetailedError<'_>> {
    let unquoted = map(take_while1(is_label_char), |s: &str| s.to_string());

    let single_quoted = delimited(
        char('\''),
        map(
            recognize(many0(alt((is_not("'"), tag("''"))))),
            |s: &str| s.replace("''", "'"),
        ),
        char('\''),
    );

    let double_quoted = delimited(
        char('"'),
        map(
            recognize(many0(alt((is_not("\""), tag("\"\""))))),
            |s: &str| s.replace("\"\"", "\""),
        ),
        char('"'),
    );

    context("label", alt((single_quoted, double_quoted, unquoted))).parse(input)
}

// Branch length, ":0.123", scientific notation allowed
fn parse_length(input: &str) -> IResult<&str, f64, DetailedError<'_>> {
    context(
        "length",
        preceded(
            ws(char(':')),
            cut(map_res(
                recognize((
                    opt(alt((char('+'), char('-')))),
                    digit1,
                    opt((char('.'), digit1)),
                    opt((
                        alt((char('e'), char('E'))),
                        opt(alt((char('+'), char('-')))),
                        digit1,
                    )),
                )),
                |s: &str| s.parse::<f64>(),
            )),
        ),
    )
    .parse(input)
}

// Any [...] block, returns its body
fn parse_comment(input: &str) -> IResult<&str, &str, DetailedError<'_>> {
    context(
        "comment",
        ws(delimited(char('['), take_while(|c| c != ']'), char(']'))),
    )
    .parse(input)
}

// [&R], [&U] or [&WEIGHT=w] before a tree; other comments are ignored
fn parse_header(input: &str) -> IResult<&str, Header, DetailedError<'_>> {
    context(
        "tree header",
        map_res(parse_comment, |body: &str| {
            let upper = body.trim().to_ascii_uppercase();
            match upper.as_str() {
                "&R" => Ok(Header::Rooted(true)),
                "&U" => Ok(Header::Rooted(false)),
                _ => match upper.strip_prefix("&WEIGHT=") {
                    Some(w) => w.trim().parse::<f64>().map(Header::Weight),
                    None => Ok(Header::Other),
                },
            }
        }),
    )
    .parse(input)
}

// (child1,child2,...)Label[comment]:Length[comment]
fn parse_subtree(input: &str) -> IResult<&str, ParsedNode, DetailedError<'_>> {
    // Once '(' is seen there is no way back, so errors point at the
    // offending character instead of the start of the tree.
    let (input, children) = context(
        "children",
        opt(preceded(
            ws(char('(')),
            cut(terminated(
                separated_list1(ws(char(',')), parse_subtree),
                ws(char(')')),
            )),
        )),
    )
    .parse(input)?;

    let (input, label) = opt(ws(parse_label)).parse(input)?;
    let (input, _) = many0(parse_comment).parse(input)?;
    let (input, length) = opt(parse_length).parse(input)?;
    let (input, _) = many0(parse_comment).parse(input)?;

    Ok((
        input,
        ParsedNode {
            name: label.filter(|l| !l.is_empty()),
            length,
            children: children.unwrap_or_default(),
        },
    ))
}

// Trees separated by ';' until the input runs out
fn parse_trees(input: &str) -> IResult<&str, Vec<ParsedTree>, DetailedError<'_>> {
    let mut trees = Vec::new();
    let mut rest = input;
    loop {
        let (r, headers) = many0(ws(parse_header)).parse(rest)?;
        let (r, _) = multispace0(r)?;
        if r.is_empty() {
            return Ok((r, trees));
        }
        let (r, root) = context("tree", ws(parse_subtree)).parse(r)?;
        let (r, _) = context("tree end", cut(ws(char(';')))).parse(r)?;
        trees.push(ParsedTree::new(root, headers));
        rest = r;
    }
}

fn parse_clade(input: &str) -> IResult<&str, Vec<String>, DetailedError<'_>> {
    context(
        "constraint",
        terminated(
            many1(terminated(ws(parse_label), opt(ws(char(','))))),
            cut(ws(char(';'))),
        ),
    )
    .parse(input)
}

// ================================================================================================
// Entry Points
// ================================================================================================

/// Parses every tree in `input`.
///
/// Weights outside [0, 1] are rejected.
pub fn parse_newick_multi(input: &str) -> Result<Vec<ParsedTree>> {
    let trees = match parse_trees(input) {
        Ok((_, trees)) => trees,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(make_tree_error(input, e))
        }
        Err(nom::Err::Incomplete(_)) => return Err(incomplete()),
    };

    for (i, parsed) in trees.iter().enumerate() {
        if !(0.0..=1.0).contains(&parsed.weight) {
            return Err(MulRfError::config(format!(
                "Tree {}: weight {} is outside [0, 1]",
                i + 1,
                parsed.weight
            )));
        }
    }
    Ok(trees)
}

/// Parses the first tree of `input`.
pub fn parse_newick(input: &str) -> Result<ParsedTree> {
    parse_newick_multi(input)?
        .into_iter()
        .next()
        .ok_or_else(|| MulRfError::config("No tree found"))
}

/// Parses constraint clades: taxon names separated by commas or whitespace,
/// each clade terminated by ';'.
pub fn parse_constraints(input: &str) -> Result<Vec<Vec<String>>> {
    let mut parser = all_consuming(terminated(many0(parse_clade), multispace0));
    match parser.parse(input) {
        Ok((_, clades)) => Ok(clades),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(make_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(incomplete()),
    }
}

fn incomplete() -> MulRfError {
    MulRfError::ParseError {
        message: "Incomplete input".to_string(),
        line: 0,
        column: 0,
        snippet: "".to_string(),
    }
}

// Convert nom errors into a positioned MulRfError
fn make_tree_error(input: &str, e: DetailedError) -> MulRfError {
    let remaining = e.errors.first().map(|(r, _)| *r).unwrap_or(input);
    let offset = input.offset(remaining);

    let prefix = &input[..offset];
    let line = prefix.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = prefix.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = offset - last_newline + 1;

    let mut msg = String::new();
    for (_, kind) in e.errors.iter().rev() {
        match kind {
            DetailedErrorKind::Context(ctx) => {
                msg.push_str(&format!("while parsing {}:\n", ctx));
            }
            DetailedErrorKind::Nom(k) => {
                msg.push_str(&format!("  error: {:?}\n", k));
            }
        }
    }

    MulRfError::ParseError {
        message: msg,
        line,
        column,
        snippet: remaining.chars().take(50).collect(),
    }
}
