use anyhow::{Context, Result};
use clap::ArgMatches;
use tracing::info;

use tractshape::{orient_by_rois, read_tck, read_volume, write_tck, NiftiVolume, ReferenceGrid};

fn reorient_file(input: &str, output: &str, grid: &ReferenceGrid, start: &NiftiVolume, end: &NiftiVolume) -> Result<()> {
    let tck = read_tck(input).with_context(|| format!("failed to read track file '{}'", input))?;
    let oriented = orient_by_rois(&tck.tract, grid, start, end)?;
    write_tck(output, &oriented, Some(&tck.header)).with_context(|| format!("failed to write '{}'", output))?;
    info!("Wrote {} reoriented streamlines to {}.", oriented.num_streamlines(), output);
    Ok(())
}

pub fn run_reorient(matches: &ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .context("A path to the input track file is required.")?;
    let start_roi = matches
        .get_one::<String>("start_roi")
        .context("A path to the start ROI is required.")?;
    let end_roi = matches
        .get_one::<String>("end_roi")
        .context("A path to the end ROI is required.")?;
    let output = matches
        .get_one::<String>("output")
        .context("An output path is required.")?;

    let start = read_volume(start_roi).with_context(|| format!("failed to read start ROI '{}'", start_roi))?;
    let end = read_volume(end_roi).with_context(|| format!("failed to read end ROI '{}'", end_roi))?;
    let grid = match matches.get_one::<String>("reference") {
        Some(reference) => ReferenceGrid::from_file(reference)
            .with_context(|| format!("failed to read reference image '{}'", reference))?,
        None => start.grid().context("failed to get the voxel grid of the start ROI")?,
    };

    reorient_file(input, output, &grid, &start, &end)?;
    if let (Some(centroid), Some(centroid_output)) =
        (matches.get_one::<String>("centroid"), matches.get_one::<String>("centroid_output"))
    {
        reorient_file(centroid, centroid_output, &grid, &start, &end)?;
    }

    Ok(())
}
