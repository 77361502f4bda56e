use anyhow::{bail, Result};
use colored::Colorize;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use libconfusa::align::Aligner;
use libconfusa::confusable::{
    deidentified_encodings, find_confusable_subsets, find_confusable_subsets_deidentified, McSet,
    SubsetEncoding,
};
use libconfusa::entropy::{entropy_matrix, entropy_matrix_deidentified};

use crate::args::{DiscoverArgs, EncodeArgs, EntropyArgs};
use crate::io::{read_json, read_plat, write_json};

pub fn discover(args: &DiscoverArgs) -> Result<()> {
    let plat = read_plat(&args.plat_path, args.common_args.delimiter)?;
    let mut aligner = Aligner::new();

    let discovered = if args.deidentified {
        let mut rng = Pcg64::seed_from_u64(args.rng_seed);
        find_confusable_subsets_deidentified(
            &mut aligner,
            &plat,
            &mut rng,
            &args.multialign_args.params(),
        )?
    } else {
        find_confusable_subsets(&mut aligner, &plat)?
    };
    let sets: Vec<McSet> = discovered.into_iter().collect();

    println!("{} {}", "confusable subsets:".bold(), sets.len());
    for set in &sets {
        println!("  {set:?}");
    }

    write_json(&args.output_path, &sets, args.common_args.allow_overwrite)
}

pub fn encode(args: &EncodeArgs) -> Result<()> {
    let plat = read_plat(&args.plat_path, args.common_args.delimiter)?;
    let sets: Vec<McSet> = read_json(&args.subsets_path)?;

    let mut aligner = Aligner::new();
    let mut rng = Pcg64::seed_from_u64(args.rng_seed);
    let encodings = deidentified_encodings(
        &mut aligner,
        &plat,
        &sets,
        &mut rng,
        &args.multialign_args.params(),
    )?;

    println!(
        "{} {} subsets x {} rows",
        "encoded:".bold(),
        encodings.len(),
        plat.num_rows()
    );

    write_json(
        &args.output_path,
        &encodings,
        args.common_args.allow_overwrite,
    )
}

pub fn entropy(args: &EntropyArgs) -> Result<()> {
    let plat = read_plat(&args.plat_path, args.common_args.delimiter)?;

    let matrix = if let Some(subsets_path) = &args.subsets_path {
        let sets: Vec<McSet> = read_json(subsets_path)?;
        let mut aligner = Aligner::new();
        entropy_matrix(&mut aligner, &plat, &sets)?
    } else if let Some(encodings_path) = &args.encodings_path {
        let encodings: Vec<SubsetEncoding> = read_json(encodings_path)?;
        entropy_matrix_deidentified(plat.num_rows(), &encodings)?
    } else {
        bail!("either --subsets or --encodings is required");
    };

    println!(
        "{} {} rows x {} subsets",
        "entropy matrix:".bold(),
        matrix.num_rows(),
        matrix.num_sets()
    );

    write_json(&args.output_path, &matrix, args.common_args.allow_overwrite)
}
