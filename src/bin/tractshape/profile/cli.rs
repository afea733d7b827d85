use clap::{arg, value_parser, Command};

pub const PROFILE_CMD: &str = "profile";

pub fn create_profile_cli() -> Command {
    Command::new(PROFILE_CMD)
        .about("Sample a scalar map (e.g., FA) at equally spaced nodes along a bundle.")
        .after_help("Writes a CSV file with one value per node. By default the streamlines are weighted by their distance to the core of the bundle.")
        .arg(arg!(-i --input <input> "Track file (.tck) of the bundle").required(true))
        .arg(arg!(-s --scalar_map <scalar_map> "NIfTI image of the scalar map, in the space of the bundle").required(true))
        .arg(arg!(-o --output <output> "Output CSV file of the profile").required(true))
        .arg(
            arg!(-n --num_nodes <num_nodes> "Number of nodes along the bundle")
                .value_parser(value_parser!(usize))
                .default_value("100"),
        )
        .arg(arg!(--unweighted "Average the streamlines at each node instead of weighting them"))
}
