use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use tractshape::{compute_report, TractshapeError};

use super::cli::create_morphometrics_cli;

pub fn run_morphometrics(matches: &ArgMatches) -> Result<()> {
    let reference = matches
        .get_one::<String>("reference_nii")
        .context("A reference NIfTI image is required.")?;
    let left = matches.get_one::<String>("left_tract").map(Path::new);
    let right = matches.get_one::<String>("right_tract").map(Path::new);
    let output = matches
        .get_one::<String>("output")
        .context("An output file is required.")?;

    let report = match compute_report(Path::new(reference), left, right, Path::new(output)) {
        Ok(report) => report,
        Err(err @ TractshapeError::InvalidArgument(_)) => {
            create_morphometrics_cli().print_help()?;
            return Err(err).context("At least one of --left_tract and --right_tract must be given.");
        }
        Err(err) => return Err(err).with_context(|| format!("failed to compute the tract metrics report '{}'", output)),
    };

    if let Some(m) = &report.left {
        println!("Left Tract Metrics: {}", m);
    }
    if let Some(m) = &report.right {
        println!("Right Tract Metrics: {}", m);
    }
    if let Some(r) = &report.ratios {
        println!("Ratios Between Left and Right Tracts: {}", r);
    }

    Ok(())
}
