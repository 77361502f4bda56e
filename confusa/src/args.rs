use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use libconfusa::search::MultialignParams;

#[derive(Subcommand)]
pub enum SubCommands {
    #[command(about = "Find maximally confusable column subsets of a plat")]
    Discover(DiscoverArgs),
    #[command(about = "Re-encode distinguishers over shared layers for discovered subsets")]
    Encode(EncodeArgs),
    #[command(about = "Compute per-row confusability entropy for discovered subsets")]
    Entropy(EntropyArgs),
}

#[derive(Parser)]
#[command(name = "confusa")]
#[command(
    about = "Analyze inflectional paradigm tables for maximally confusable subsets of lexemes and the entropy of their confusability"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// The cell delimiter of the plat file
    #[arg(
        short = 'd',
        long = "delimiter",
        default_value_t = ',',
        value_name = "CHAR"
    )]
    pub delimiter: char,

    /// Allow confusa to overwrite files
    #[arg(short = 'q', long = "allow-overwrite", default_value_t = false)]
    pub allow_overwrite: bool,
}

/// Arguments that are passed to the layer alignment in libconfusa
#[derive(Args, Debug, Clone)]
pub struct MultialignArgs {
    /// How many of the longest distinguishers seed the joint layer alignment
    #[arg(long = "align-seed-size", default_value_t = 10usize, value_name = "n")]
    pub seed_size: usize,

    /// Step budget for the joint seed alignment before the seed set shrinks
    #[arg(
        long = "align-step-budget",
        default_value_t = 5000usize,
        value_name = "n"
    )]
    pub step_budget: usize,
}

impl MultialignArgs {
    pub fn params(&self) -> MultialignParams {
        MultialignParams {
            seed_size: self.seed_size,
            step_budget: self.step_budget,
        }
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Plat file: a header row, then one row per microclass with a
    /// leading label cell
    #[arg(value_name = "PLAT.csv")]
    pub plat_path: PathBuf,

    /// Where to place the subsets output file
    #[arg(short = 'o', long = "output", default_value = "subsets.json")]
    pub output_path: PathBuf,

    /// Use the deidentified pipeline: sampled representatives,
    /// layer-encoded distinguishers, bijection matching
    #[arg(long = "deidentified", default_value_t = false)]
    pub deidentified: bool,

    /// Seed for the sampling random source (deidentified only)
    #[arg(long = "rng-seed", default_value_t = 0u64, value_name = "n")]
    pub rng_seed: u64,

    /// Arguments that control the layer alignment
    #[command(flatten)]
    pub multialign_args: MultialignArgs,

    /// Arguments that are common across all confusa subcommands
    #[command(flatten)]
    pub common_args: CommonArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Plat file
    #[arg(value_name = "PLAT.csv")]
    pub plat_path: PathBuf,

    /// The path to previously discovered subsets
    #[arg(value_name = "SUBSETS.json")]
    pub subsets_path: PathBuf,

    /// Where to place the encodings output file
    #[arg(short = 'o', long = "output", default_value = "encodings.json")]
    pub output_path: PathBuf,

    /// Seed for the sampling random source
    #[arg(long = "rng-seed", default_value_t = 0u64, value_name = "n")]
    pub rng_seed: u64,

    #[command(flatten)]
    pub multialign_args: MultialignArgs,

    #[command(flatten)]
    pub common_args: CommonArgs,
}

#[derive(Args, Debug)]
pub struct EntropyArgs {
    /// Plat file
    #[arg(value_name = "PLAT.csv")]
    pub plat_path: PathBuf,

    /// Subsets from the plain pipeline
    #[arg(
        long = "subsets",
        value_name = "SUBSETS.json",
        required_unless_present = "encodings_path",
        conflicts_with = "encodings_path"
    )]
    pub subsets_path: Option<PathBuf>,

    /// Layer encodings from the deidentified pipeline
    #[arg(long = "encodings", value_name = "ENCODINGS.json")]
    pub encodings_path: Option<PathBuf>,

    /// Where to place the entropy matrix output file
    #[arg(short = 'o', long = "output", default_value = "entropy.json")]
    pub output_path: PathBuf,

    #[command(flatten)]
    pub common_args: CommonArgs,
}
