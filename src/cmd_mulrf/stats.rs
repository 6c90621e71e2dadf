use clap::*;
use mulrf::libs::phylo::lca::LcaIndex;
use mulrf::libs::phylo::reader;
use mulrf::libs::phylo::subtree::ClusterSizesRooted;
use mulrf::libs::phylo::taxa::{TaxaRegistry, TreeTaxaMap};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("stats")
        .about("Prints taxa and weights of the input trees")
        .after_help(
            r###"
Prints one line per input tree, then totals.

Output format:
  Input gene tree of taxa = 4 and weight = 1.00
  ...
  Number of trees = 3
  Number of taxa = 5
  Multi-labelled trees = 1

A multi-labelled tree holds a taxon at more than one leaf; its taxa count
is the number of distinct labels.

Examples:
1. Check an input file:
   mulrf stats genes.nwk

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

    let trees = reader::read_trees(infile)?;

    let mut registry = TaxaRegistry::new();
    for parsed in &trees {
        registry.insert_names(&parsed.names);
    }

    let mut n_multi = 0;
    for parsed in &trees {
        let taxa = TreeTaxaMap::create(&parsed.names, &registry);
        if taxa.multi_count() > 0 {
            n_multi += 1;
        }

        // distinct taxa below the root
        let n_taxa = match parsed.tree.get_root() {
            Some(root) if !parsed.tree.is_leaf(root) => {
                let lca = LcaIndex::new(&parsed.tree);
                ClusterSizesRooted::new(&parsed.tree, &taxa, &lca).cluster_size(root)
            }
            _ => taxa.unique_count(),
        };
        writer.write_fmt(format_args!(
            "Input gene tree of taxa = {} and weight = {:.2}\n",
            n_taxa, parsed.weight
        ))?;
    }

    writer.write_fmt(format_args!("Number of trees = {}\n", trees.len()))?;
    writer.write_fmt(format_args!("Number of taxa = {}\n", registry.len()))?;
    writer.write_fmt(format_args!("Multi-labelled trees = {}\n", n_multi))?;

    Ok(())
}
