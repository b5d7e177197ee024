//! `serve` - run the HTTP server.

use mediafetch_axum::{ServerConfig, start_server};

use crate::commands::ServeArgs;

/// Start the server with environment config overlaid by `args`.
pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.apply(ServerConfig::from_env());
    start_server(config).await
}
