//! CLI entry point - the composition root for the binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mediafetch_cli::{Cli, Commands, ServeArgs, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => handlers::serve::execute(args).await?,
        Commands::Install(args) => handlers::install::execute(args).await?,
        Commands::Platform => handlers::platform::execute(),
    }

    Ok(())
}
