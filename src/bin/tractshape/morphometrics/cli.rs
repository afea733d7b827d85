use clap::{arg, Arg, Command};

use tractshape::DEFAULT_METRICS_OUTPUT;

pub const MORPHOMETRICS_CMD: &str = "morphometrics";

pub fn create_morphometrics_cli() -> Command {
    Command::new(MORPHOMETRICS_CMD)
        .about("Compute shape metrics of a left and/or right tract, and their ratios if both are given.")
        .after_help("Writes a CSV file with one row per metric and the columns Metric, Left Tract, Right Tract and Ratio (L/R). Lengths are in world units (usually mm), volume and surface area in voxel units of the reference image.")
        .arg(Arg::new("reference_nii").required(true).help("Reference NIfTI image defining the voxel grid"))
        .arg(arg!(--left_tract <left_tract> "Track file (.tck) of the left tract"))
        .arg(arg!(--right_tract <right_tract> "Track file (.tck) of the right tract"))
        .arg(arg!(--output <output> "Name of the output CSV file").default_value(DEFAULT_METRICS_OUTPUT))
}
