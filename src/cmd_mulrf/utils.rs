use mulrf::libs::phylo::taxa::TaxonNames;
use mulrf::libs::phylo::writer::{write_newick, write_newick_with};
use mulrf::libs::phylo::{ParsedTree, Tree};
use std::io::Write;

/// A seed from the clock when none is given
pub fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn write_species_tree(
    writer: &mut dyn Write,
    header: &str,
    tree: &Tree,
    names: &TaxonNames,
) -> anyhow::Result<()> {
    writer.write_fmt(format_args!("{}\n{}\n", header, write_newick(tree, names)))?;
    Ok(())
}

/// Gene trees as read, each preceded by its weighted score and weight.
pub fn write_gene_trees(
    writer: &mut dyn Write,
    trees: &[ParsedTree],
    scores: &[f64],
) -> anyhow::Result<()> {
    for (i, (parsed, score)) in trees.iter().zip(scores).enumerate() {
        writer.write_fmt(format_args!(
            "\n[ Gene Tree {} MulRF Score = {:.2}]\n[&WEIGHT={:.2}]{}\n",
            i,
            score,
            parsed.weight,
            write_newick_with(&parsed.tree, &parsed.names, true)
        ))?;
    }
    Ok(())
}
