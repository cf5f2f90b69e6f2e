use acgen::cli::commands::Cli;
use acgen::cli::handlers;
use acgen::io::logging::{self, LogConfig};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let log_file = logging::init(&LogConfig {
        level: cli.log_level,
        dir: cli.logs_dir.clone(),
        retention_days: cli.log_retention_days,
    });
    if let Some(path) = log_file {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
