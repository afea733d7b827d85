use anyhow::{Context, Result};
use clap::ArgMatches;

use tractshape::profile_from_files;

pub fn run_profile(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .context("A path to the input track file is required.")?;
    let scalar_map = matches
        .get_one::<String>("scalar_map")
        .context("A path to the scalar map is required.")?;
    let output = matches
        .get_one::<String>("output")
        .context("An output path is required.")?;
    let num_nodes = *matches
        .get_one::<usize>("num_nodes")
        .context("The number of nodes is required.")?;
    let weighted = !matches.get_flag("unweighted");

    profile_from_files(input, scalar_map, output, num_nodes, weighted)
        .with_context(|| format!("failed to compute the profile of '{}' along '{}'", scalar_map, input))?;
    println!("Profile saved to {}", output);

    Ok(())
}
