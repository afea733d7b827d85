use anyhow::{Context, Result};
use clap::ArgMatches;

use tractshape::{segment_mask_file, SegmentAxis};

pub fn run_segment(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input_path")
        .context("A path to the input mask is required.")?;
    let output_dir = matches
        .get_one::<String>("output_dir")
        .context("An output directory is required.")?;
    let num_segments = *matches
        .get_one::<usize>("num_segments")
        .context("The number of segments is required.")?;
    let axis = matches
        .get_one::<String>("axis")
        .context("An axis is required.")?
        .parse::<SegmentAxis>()
        .map_err(anyhow::Error::msg)?;

    let output = segment_mask_file(input, output_dir, num_segments, axis)
        .with_context(|| format!("failed to segment mask '{}'", input))?;
    println!("Segmented mask saved to {}", output.display());

    Ok(())
}
