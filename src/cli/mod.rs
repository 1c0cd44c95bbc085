pub mod plan;
pub mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "troupe", about = "Multi-agent workflow orchestration engine", version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a workflow against a set of agents
    Run(RunArgs),
    /// Validate a workflow file and print its execution plan
    Plan(PlanArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Workflow definition file (YAML)
    #[arg(short, long)]
    pub workflow: PathBuf,

    /// Agent definitions file (YAML list)
    #[arg(short, long)]
    pub agents: PathBuf,

    /// Initial input handed to the first agent
    #[arg(short, long, default_value = "")]
    pub input: String,

    /// Engine configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sandbox strategy override: none, process or container
    #[arg(long)]
    pub sandbox: Option<String>,

    /// Print the execution log after the run
    #[arg(long)]
    pub show_logs: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Workflow definition file (YAML)
    #[arg(short, long)]
    pub workflow: PathBuf,
}
