//! `plan`: track a degree plan against a requirement catalog from the
//! command line.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
