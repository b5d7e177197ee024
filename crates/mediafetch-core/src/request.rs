//! Download request and artifact types.

use url::Url;

use crate::classify::MediaCategory;
use crate::error::DownloadError;

/// Upper bound on a format selector, in bytes.
pub const MAX_FORMAT_LEN: usize = 512;

const DEFAULT_VIDEO_FORMAT: &str = "bestvideo[height<=720][ext=mp4][vcodec=h264]+bestaudio[acodec=aac]/best[height<=720][vcodec=h264]/best[ext=mp4]/best";
const DEFAULT_AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// The kind of media an endpoint asks for; decides the default selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Extractor format selector used when the caller supplies none.
    pub const fn default_format(self) -> &'static str {
        match self {
            Self::Video => DEFAULT_VIDEO_FORMAT,
            Self::Audio => DEFAULT_AUDIO_FORMAT,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// A validated request to fetch one media item.
///
/// Construction is the only validation point: a `DownloadRequest` always
/// carries an absolute http(s) URL and a non-empty format selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: Url,
    format: String,
}

impl DownloadRequest {
    /// Validate a raw URL and format selector.
    pub fn new(url: &str, format: &str) -> Result<Self, DownloadError> {
        let url = parse_url(url)?;
        let format = validate_format(format)?;
        Ok(Self {
            url,
            format: format.to_string(),
        })
    }

    /// Build a request from optional query values, applying the default
    /// selector for `kind` when `format` is absent or blank.
    pub fn from_query(
        kind: MediaKind,
        url: Option<&str>,
        format: Option<&str>,
    ) -> Result<Self, DownloadError> {
        let url = url.ok_or_else(|| DownloadError::invalid_input("Invalid URL provided"))?;
        let format = format
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| kind.default_format());
        Self::new(url, format)
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

fn parse_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw).map_err(|_| DownloadError::invalid_input("Invalid URL provided"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(DownloadError::invalid_input("Invalid URL provided")),
    }
}

fn validate_format(raw: &str) -> Result<&str, DownloadError> {
    let format = raw.trim();
    if format.is_empty() {
        return Err(DownloadError::invalid_input("Format selector cannot be empty"));
    }
    if format.len() > MAX_FORMAT_LEN {
        return Err(DownloadError::invalid_input(format!(
            "Format selector exceeds {MAX_FORMAT_LEN} bytes"
        )));
    }
    if format.chars().any(char::is_control) {
        return Err(DownloadError::invalid_input(
            "Format selector contains control characters",
        ));
    }
    Ok(format)
}

/// A downloaded file, fully buffered, ready to be written to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub bytes: Vec<u8>,
    pub mimetype: String,
    pub filename: String,
    pub category: MediaCategory,
}
