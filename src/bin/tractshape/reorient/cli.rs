use clap::{arg, Command};

pub const REORIENT_CMD: &str = "reorient";

pub fn create_reorient_cli() -> Command {
    Command::new(REORIENT_CMD)
        .about("Flip streamlines so that all of them run from a start ROI to an end ROI.")
        .arg(arg!(-i --input <input> "Track file (.tck) of the bundle").required(true))
        .arg(arg!(-s --start_roi <start_roi> "NIfTI mask of the start region").required(true))
        .arg(arg!(-e --end_roi <end_roi> "NIfTI mask of the end region").required(true))
        .arg(arg!(-r --reference <reference> "NIfTI image whose affine places the ROI voxels in world space (default: the start ROI)"))
        .arg(arg!(-o --output <output> "Output track file of the reoriented bundle").required(true))
        .arg(arg!(-c --centroid <centroid> "Track file of the bundle centroid, reoriented as well").requires("centroid_output"))
        .arg(arg!(--centroid_output <centroid_output> "Output track file of the reoriented centroid").requires("centroid"))
}
