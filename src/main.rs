use clap::Parser;
use tracing_subscriber::EnvFilter;
use volguard::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    run(Cli::parse())
}
