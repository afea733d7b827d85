mod connectivity;
mod morphometrics;
mod profile;
mod reorient;
mod segment;

use anyhow::Result;
use clap::Command;
use tracing_subscriber::EnvFilter;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "tractshape";
    pub const DEFAULT_LOG_FILTER: &str = "tractshape=info";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Tim Schäfer")
        .about("Morphometry of white matter tracts: shape metrics, left/right ratios, mask segmentation, streamline orientation, along-tract profiles and connectivity.")
        .subcommand_required(true)
        .subcommand(morphometrics::cli::create_morphometrics_cli())
        .subcommand(segment::cli::create_segment_cli())
        .subcommand(reorient::cli::create_reorient_cli())
        .subcommand(profile::cli::create_profile_cli())
        .subcommand(connectivity::cli::create_connectivity_cli())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(consts::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        Some((morphometrics::cli::MORPHOMETRICS_CMD, matches)) => {
            morphometrics::handlers::run_morphometrics(matches)?;
        }

        Some((segment::cli::SEGMENT_CMD, matches)) => {
            segment::handlers::run_segment(matches)?;
        }

        Some((reorient::cli::REORIENT_CMD, matches)) => {
            reorient::handlers::run_reorient(matches)?;
        }

        Some((profile::cli::PROFILE_CMD, matches)) => {
            profile::handlers::run_profile(matches)?;
        }

        Some((connectivity::cli::CONNECTIVITY_CMD, matches)) => {
            connectivity::handlers::run_connectivity(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
