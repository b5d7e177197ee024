//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the mediafetch server.
#[derive(Debug, Parser)]
#[command(name = "mediafetch")]
#[command(about = "HTTP service that downloads video and audio through yt-dlp")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub const fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "mediafetch=debug,tower_http=debug,info"
        } else {
            "info"
        }
    }
}
