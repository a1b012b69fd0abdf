use clap::{Parser, Subcommand};

/// Weaver gateway - status probes and REST chat passthrough
#[derive(Parser, Debug)]
#[command(name = "weaver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve /health, /ready and /chat until Ctrl+C
    Serve {
        /// Bind host (default: WEAVER_HEALTH_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (default: WEAVER_HEALTH_PORT or 18790)
        #[arg(long)]
        port: Option<u16>,
    },
}
