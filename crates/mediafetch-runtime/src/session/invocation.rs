//! Extractor command invocation builder.
//!
//! Every value is a separate argv entry; no shell ever sees the command, so
//! caller-supplied URLs and selectors cannot change argument boundaries.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Output filename stem; the extractor picks the extension.
pub const OUTPUT_STEM: &str = "download";

/// Output template placeholder resolved by the extractor.
const EXT_PLACEHOLDER: &str = "%(ext)s";

/// Output path template scoped to `dir`.
pub fn output_template(dir: &Path) -> PathBuf {
    dir.join(format!("{OUTPUT_STEM}.{EXT_PLACEHOLDER}"))
}

/// Builder for an extractor invocation.
///
/// ```rust,ignore
/// let cmd = ExtractorCommand::new(binary, request.url().as_str())
///     .max_filesize(config.max_file_size)
///     .output_template(output_template(session.path()))
///     .format(request.format())
///     .flag("--no-playlist")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ExtractorCommand {
    binary_path: PathBuf,
    url: String,
    max_filesize: Option<u64>,
    output_template: Option<PathBuf>,
    format: Option<String>,
    flags: Vec<String>,
}

impl ExtractorCommand {
    pub fn new(binary_path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            url: url.into(),
            max_filesize: None,
            output_template: None,
            format: None,
            flags: Vec::new(),
        }
    }

    /// Abort downloads larger than `bytes`.
    #[must_use]
    pub const fn max_filesize(mut self, bytes: u64) -> Self {
        self.max_filesize = Some(bytes);
        self
    }

    #[must_use]
    pub fn output_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn format(mut self, selector: impl Into<String>) -> Self {
        self.format = Some(selector.into());
        self
    }

    /// Add a value-less flag.
    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// The argument vector, in order:
    /// 1. `--max-filesize <bytes>`
    /// 2. flags in the order they were added
    /// 3. `-o <template>`
    /// 4. `-f <selector>`
    /// 5. `--` then the URL, so it is never parsed as an option
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        if let Some(bytes) = self.max_filesize {
            args.push("--max-filesize".into());
            args.push(bytes.to_string().into());
        }

        args.extend(self.flags.iter().map(OsString::from));

        if let Some(template) = &self.output_template {
            args.push("-o".into());
            args.push(template.as_os_str().to_owned());
        }

        if let Some(format) = &self.format {
            args.push("-f".into());
            args.push(format.into());
        }

        args.push("--".into());
        args.push(self.url.clone().into());
        args
    }

    /// Build the command. Stdio and lifecycle options are left to the caller.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(self.args());
        cmd
    }
}
