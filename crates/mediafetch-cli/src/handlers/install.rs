//! `install` - provision the extractor binary ahead of time.

use anyhow::Context;
use mediafetch_core::{DownloaderConfig, PlatformKey};
use mediafetch_runtime::build_provisioner;

use crate::commands::InstallArgs;

pub async fn execute(args: InstallArgs) -> anyhow::Result<()> {
    let force = args.force;
    let config = args.binary.apply(DownloaderConfig::from_env());
    let provisioner = build_provisioner(&config, &PlatformKey::current());

    if force && config.binary_override.is_none() {
        let target = provisioner.target_path();
        match tokio::fs::remove_file(&target).await {
            Ok(()) => tracing::info!(path = %target.display(), "Removed existing extractor binary"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("removing {}", target.display()));
            }
        }
    }

    let path = provisioner
        .ensure()
        .await
        .context("failed to provision extractor binary")?;
    println!("yt-dlp ready at {}", path.display());
    Ok(())
}
