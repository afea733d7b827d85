use clap::{arg, Command};

pub const CONNECTIVITY_CMD: &str = "connectivity";

pub fn create_connectivity_cli() -> Command {
    Command::new(CONNECTIVITY_CMD)
        .about("Count the streamlines of a bundle connecting each pair of labels of a parcellation.")
        .after_help("Writes the symmetric connectivity matrix as CSV, with the connections to the background label 0 set to zero.")
        .arg(arg!(-i --input <input> "Track file (.tck) of the bundle").required(true))
        .arg(arg!(-l --labels <labels> "NIfTI label image of the parcellation").required(true))
        .arg(arg!(-o --output <output> "Output CSV file of the connectivity matrix").required(true))
}
