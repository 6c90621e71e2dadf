use clap::*;
use log::info;
use mulrf::libs::phylo::reader;
use mulrf::libs::phylo::{BuildOptions, SupertreeBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

use super::utils;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("build")
        .about("Build a minimum RF supertree")
        .after_help(
            r###"
Builds a species tree over all taxa of the input gene trees, minimizing the
sum of weight * RF distance.

Taxa are inserted one by one at their best edge, then SPR moves are applied
while they lower the score. Taxa present several times in one gene tree are
held by hubs in the species tree and written once in the output.

Input format:
* NEWICK trees, one per `;`
* `[&WEIGHT=w]` before a tree sets its weight (0 to 1, default 1)
* `[&R]`/`[&U]` and other bracket comments are accepted

Constraints file:
* Lists of taxa separated by commas or spaces, each ending with `;`
* Each list must stay a clade; a taxon may be in one list only

Output:
* [ Species Tree: Unrooted RF Score = X.XX]
* The species tree
* With --inputtrees, each gene tree with its weighted score

Examples:
1. Build a supertree:
   mulrf build genes.nwk -o supertree.nwk

2. Refine a starting tree, the first one of the input:
   mulrf build with_start.nwk --stree

3. Keep clades together, reproducible run:
   mulrf build genes.nwk -c clades.txt --seed 42

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
            Arg::new("stree")
                .long("stree")
                .action(ArgAction::SetTrue)
                .help("The first input tree is a starting species tree"),
        )
        .arg(
            Arg::new("constraints")
                .long("constraints")
                .short('c')
                .num_args(1)
                .help("A file of clades to keep"),
        )
        .arg(
            Arg::new("initialtree")
                .long("initialtree")
                .action(ArgAction::SetTrue)
                .help("Also write the species tree before SPR refinement"),
        )
        .arg(
            Arg::new("inputtrees")
                .long("inputtrees")
                .action(ArgAction::SetTrue)
                .help("Also write the input trees with their scores"),
        )
        .arg(
            Arg::new("alltrees")
                .long("alltrees")
                .action(ArgAction::SetTrue)
                .help("Same as --initialtree --inputtrees"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .value_parser(value_parser!(u64))
                .help("Random seed. Taken from the clock by default"),
        )
        .arg(
            Arg::new("max_rounds")
                .long("max-rounds")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Stop SPR refinement after this many rounds"),
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
    //----------------------------
    // Args
    //----------------------------
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());
    let infile = args.get_one::<String>("infile").unwrap();

    let is_all = args.get_flag("alltrees");
    let is_initial = is_all || args.get_flag("initialtree");
    let is_input = is_all || args.get_flag("inputtrees");

    let seed = args
        .get_one::<u64>("seed")
        .copied()
        .unwrap_or_else(utils::time_seed);
    let options = BuildOptions {
        max_rounds: args.get_one::<usize>("max_rounds").copied(),
        verify: true,
    };

    //----------------------------
    // Input
    //----------------------------
    let timer = std::time::Instant::now();
    let mut trees = reader::read_trees(infile)?;
    let stree = if args.get_flag("stree") && !trees.is_empty() {
        Some(trees.remove(0))
    } else {
        None
    };
    info!("Random seed: {}", seed);

    //----------------------------
    // Operating
    //----------------------------
    let mut builder = SupertreeBuilder::new(&trees, StdRng::seed_from_u64(seed), options)?;
    if let Some(file) = args.get_one::<String>("constraints") {
        let lists = reader::read_constraints(file)?;
        builder.with_constraints(&lists)?;
    }
    if let Some(stree) = &stree {
        builder.start_from(stree, false)?;
    }
    builder.build()?;
    info!(
        "Finished in {:.2?}: {} SPR rounds, RF score = {:.2}",
        timer.elapsed(),
        builder.rounds(),
        builder.total_score()
    );

    //----------------------------
    // Output
    //----------------------------
    if is_initial {
        if let Some((tree, names)) = builder.initial_species_tree() {
            utils::write_species_tree(&mut writer, "[ Initial Species Tree ]", tree, names)?;
        }
    }

    let (tree, names) = builder.species_tree()?;
    let header = format!(
        "[ Species Tree: Unrooted RF Score = {:.2}]",
        builder.total_score()
    );
    utils::write_species_tree(&mut writer, &header, &tree, &names)?;

    if is_input {
        utils::write_gene_trees(&mut writer, &trees, &builder.weighted_scores())?;
    }
    writer.flush()?;

    Ok(())
}
