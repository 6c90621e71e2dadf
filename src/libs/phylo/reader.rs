use super::parser::{parse_constraints, parse_newick_multi, ParsedTree};
use anyhow::{anyhow, bail};
use std::io::Read;

fn read_text(infile: &str) -> anyhow::Result<String> {
    if infile != "stdin" && !std::path::Path::new(infile).is_file() {
        bail!("Cannot open input file '{}'", infile);
    }
    let mut reader = intspan::reader(infile);
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| anyhow!("Read error in '{}': {}", infile, e))?;
    Ok(text)
}

/// Read every NEWICK tree of a file ("stdin" for standard input).
pub fn read_trees(infile: &str) -> anyhow::Result<Vec<ParsedTree>> {
    let text = read_text(infile)?;
    parse_newick_multi(&text).map_err(|e| anyhow!("{}: {}", infile, e))
}

/// Read constraint clades, one `;`-terminated list of taxa each.
pub fn read_constraints(infile: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let text = read_text(infile)?;
    parse_constraints(&text).map_err(|e| anyhow!("{}: {}", infile, e))
}
