//! Command-line interface for batch livability analysis.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod analyse;
mod error;

pub use error::CliError;

use analyse::AnalyseArgs;

pub(crate) const ARG_ADDRESS: &str = "address";
pub(crate) const ARG_ADDRESSES_FILE: &str = "addresses-file";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_FOURSQUARE_API_KEY: &str = "foursquare-api-key";
pub(crate) const ARG_NOMINATIM_URL: &str = "nominatim-url";
pub(crate) const ARG_OVERPASS_ENDPOINT: &str = "overpass-endpoint";
pub(crate) const ARG_GEOCODE_INTERVAL_MS: &str = "geocode-interval-ms";
pub(crate) const ENV_ADDRESSES: &str = "LIVABILITY_CMDS_ANALYSE_ADDRESSES";

/// Run the livability CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, an
/// upstream client cannot be built, or the results cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Analyse(args) => analyse::run_analyse(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "livability",
    about = "Geocode addresses and rate their surroundings",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Geocode a batch of addresses, gather nearby POIs and rate each one.
    Analyse(AnalyseArgs),
}

#[cfg(test)]
mod tests;
