use anyhow::{Context, Result};
use clap::ArgMatches;

use tractshape::connectivity_from_files;

pub fn run_connectivity(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .context("A path to the input track file is required.")?;
    let labels = matches
        .get_one::<String>("labels")
        .context("A path to the label image is required.")?;
    let output = matches
        .get_one::<String>("output")
        .context("An output path is required.")?;

    let matrix = connectivity_from_files(input, labels, output)
        .with_context(|| format!("failed to compute the connectivity of '{}' over '{}'", input, labels))?;
    println!("Connectivity matrix with {} labels saved to {}", matrix.nrows(), output);

    Ok(())
}
