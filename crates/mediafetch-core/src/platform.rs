//! Platform-specific extractor binary selection.
//!
//! Release assets are named per platform. Keys use the identifiers the
//! release page uses (`win32`, `darwin`, `x64`, `ia32`, ...), so the Rust
//! target constants are normalized before lookup.

use std::fmt;

/// Binary used when no platform-specific entry matches.
pub const DEFAULT_BINARY: &str = "yt-dlp";

const BINARY_TABLE: &[(&str, &str)] = &[
    ("win32-x64", "yt-dlp.exe"),
    ("win32-ia32", "yt-dlp_x86.exe"),
    ("darwin-x64", "yt-dlp_macos"),
    ("darwin-arm64", "yt-dlp_macos"),
    ("linux-x64", "yt-dlp_linux"),
    ("linux-arm64", "yt-dlp_linux_aarch64"),
    ("linux-arm", "yt-dlp_linux_armv7l"),
];

/// Resolve the binary name for an `(os, arch)` pair.
///
/// Exact match on `"{os}-{arch}"`; anything else yields [`DEFAULT_BINARY`].
pub fn resolve_binary_name(os: &str, arch: &str) -> &'static str {
    let key = format!("{os}-{arch}");
    BINARY_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(DEFAULT_BINARY, |&(_, binary)| binary)
}

/// Operating system and CPU architecture identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: String,
    pub arch: String,
}

impl PlatformKey {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this process was compiled for.
    pub fn current() -> Self {
        Self::new(
            normalize_os(std::env::consts::OS),
            normalize_arch(std::env::consts::ARCH),
        )
    }

    pub fn binary_name(&self) -> &'static str {
        resolve_binary_name(&self.os, &self.arch)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        other => other,
    }
}
