use clap::*;
use mulrf::libs::phylo::reader;
use mulrf::libs::phylo::{BuildOptions, SupertreeBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

use super::utils;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("score")
        .about("Score a species tree against gene trees")
        .after_help(
            r###"
The first input tree is the species tree, the others are gene trees.

Notes:
* The species tree must be binary and must not repeat a taxon
* Species tree leaves found in no gene tree are trimmed with a warning
* Gene trees may lack taxa of the species tree, or carry some twice

Output:
* [ Species Tree: Unrooted RF Score = X.XX], the weighted sum
* The species tree
* Each gene tree with weight * RF and its weight

Examples:
1. Score a tree:
   mulrf score species_and_genes.nwk

"###,
        )
        .arg(
            Arg::new("infile")
                .num_args(1)
                .index(1)
                .default_value("stdin")
                .help("Input filename. [stdin] for standard input"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    let infile = args.get_one::<String>("infile").unwrap();

    let mut trees = reader::read_trees(infile)?;
    if trees.is_empty() {
        anyhow::bail!("No input trees found");
    }
    let species = trees.remove(0);

    // no search, the generator is never drawn from
    let mut builder =
        SupertreeBuilder::new(&trees, StdRng::seed_from_u64(0), BuildOptions::default())?;
    builder.start_from(&species, true)?;

    let (tree, names) = builder.species_tree()?;
    let header = format!(
        "[ Species Tree: Unrooted RF Score = {:.2}]",
        builder.total_score()
    );
    utils::write_species_tree(&mut writer, &header, &tree, &names)?;
    utils::write_gene_trees(&mut writer, &trees, &builder.weighted_scores())?;
    writer.flush()?;

    Ok(())
}
