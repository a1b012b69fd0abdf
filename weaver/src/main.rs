mod cli;
mod gateway;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use weaver_core::observability::init_tracing;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve { host, port } => gateway::run_serve(host, port),
    }
}
