use clap::{arg, builder::PossibleValuesParser, value_parser, Command};

pub const SEGMENT_CMD: &str = "segment";

pub fn create_segment_cli() -> Command {
    Command::new(SEGMENT_CMD)
        .about("Divide a binary tract mask into ordered segments along its main axis.")
        .arg(arg!(-i --input_path <input_path> "Path to the input binary mask file").required(true))
        .arg(arg!(-o --output_dir <output_dir> "Directory for the output file").default_value("."))
        .arg(
            arg!(-n --num_segments <num_segments> "Number of segments to generate")
                .value_parser(value_parser!(usize))
                .default_value("100"),
        )
        .arg(
            arg!(--axis <axis> "Axis along which to segment the mask")
                .value_parser(PossibleValuesParser::new(["x", "y", "z", "pca"]))
                .default_value("pca"),
        )
}
