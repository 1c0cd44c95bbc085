use clap::Parser;
use tracing_subscriber::EnvFilter;

use troupe::cli::{self, Cli, Commands};
use troupe::errors::TroupeError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    let result = match cli.command {
        Commands::Run(args) => cli::run::handle_run(args).await,
        Commands::Plan(args) => cli::plan::handle_plan(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            TroupeError::Config(_) => 2,
            TroupeError::Plan(_) | TroupeError::GraphCycle(_) => 3,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}
