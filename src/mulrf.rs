extern crate clap;
use clap::*;
use env_logger::Env;

mod cmd_mulrf;

fn main() -> anyhow::Result<()> {
    // progress goes to stderr, RUST_LOG overrides the level
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let app = Command::new("mulrf")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`mulrf` - Minimum Robinson-Foulds supertrees")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_mulrf::build::make_subcommand())
        .subcommand(cmd_mulrf::score::make_subcommand())
        .subcommand(cmd_mulrf::stats::make_subcommand())
        .after_help(
            r###"Subcommands:

* build - Build a supertree minimizing the weighted RF distance
* score - Score a species tree against gene trees
* stats - Taxa and weights of the input trees

Gene trees may be multi-labelled (a taxon at several leaves) and carry a
`[&WEIGHT=w]` comment, 0 <= w <= 1.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("build", sub_matches)) => cmd_mulrf::build::execute(sub_matches),
        Some(("score", sub_matches)) => cmd_mulrf::score::execute(sub_matches),
        Some(("stats", sub_matches)) => cmd_mulrf::stats::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
