mod args;
mod extension_traits;
mod io;
mod pipeline;

use args::{Cli, SubCommands};
use pipeline::{discover, encode, entropy};

use clap::Parser;

fn main() -> anyhow::Result<()> {
    color_backtrace::install();

    match Cli::parse().command {
        SubCommands::Discover(args) => discover(&args)?,
        SubCommands::Encode(args) => encode(&args)?,
        SubCommands::Entropy(args) => entropy(&args)?,
    }
    Ok(())
}
