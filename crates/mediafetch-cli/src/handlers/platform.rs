//! `platform` - show which release asset this host uses.

use mediafetch_core::{DownloaderConfig, PlatformKey};
use mediafetch_runtime::{build_provisioner, is_executable};

pub fn execute() {
    let platform = PlatformKey::current();
    let config = DownloaderConfig::from_env();
    let target = build_provisioner(&config, &platform).target_path();

    println!("Platform: {platform}");
    println!("Binary:   {}", platform.binary_name());
    println!("Path:     {}", target.display());
    println!(
        "Status:   {}",
        if is_executable(&target) {
            "installed"
        } else {
            "not installed"
        }
    );
}
