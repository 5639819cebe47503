//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    if let Err(err) = livability_cli::run() {
        eprintln!("livability: {err}");
        std::process::exit(1);
    }
}

/// Send library `log` records to stderr, filtered by `RUST_LOG`.
fn init_logging() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
