//! haplophy
#![deny(missing_docs)]

use anyhow::Result;
use clap::Parser;
use haplophy::{init_log, run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_log(cli.verbose);
    run(&cli)
}
