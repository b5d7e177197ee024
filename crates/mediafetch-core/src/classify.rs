//! File classification by extension.

use serde::Serialize;
use std::path::Path;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

const VIDEO_MIMETYPE: &str = "video/mp4";
const AUDIO_MIMETYPE: &str = "audio/mpeg";
const DOCUMENT_MIMETYPE: &str = "application/octet-stream";

/// Content category of a downloaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Video,
    Audio,
    Document,
}

/// Result of classifying a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileClass {
    pub category: MediaCategory,
    pub mimetype: &'static str,
}

/// Classify a file by its extension (case-insensitive).
///
/// Anything that is neither a known video nor audio extension, including
/// names without an extension, is a `document`.
pub fn classify(file_name: impl AsRef<Path>) -> FileClass {
    let ext = file_name
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        FileClass {
            category: MediaCategory::Video,
            mimetype: VIDEO_MIMETYPE,
        }
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        FileClass {
            category: MediaCategory::Audio,
            mimetype: AUDIO_MIMETYPE,
        }
    } else {
        FileClass {
            category: MediaCategory::Document,
            mimetype: DOCUMENT_MIMETYPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_video_extension_is_video() {
        let class = classify("movie.MP4");
        assert_eq!(class.category, MediaCategory::Video);
        assert_eq!(class.mimetype, "video/mp4");
    }

    #[test]
    fn flac_is_audio() {
        let class = classify("track.flac");
        assert_eq!(class.category, MediaCategory::Audio);
        assert_eq!(class.mimetype, "audio/mpeg");
    }

    #[test]
    fn unknown_extension_is_document() {
        let class = classify("readme.txt");
        assert_eq!(class.category, MediaCategory::Document);
        assert_eq!(class.mimetype, "application/octet-stream");
    }

    #[test]
    fn m4a_is_not_in_the_audio_set() {
        // The default audio selector prefers m4a; it is still served as a document.
        assert_eq!(classify("download.m4a").category, MediaCategory::Document);
    }

    #[test]
    fn edge_names_fall_back_to_document() {
        for name in ["download", ".mp4", "archive.tar.gz", ""] {
            assert_eq!(classify(name).category, MediaCategory::Document, "{name}");
        }
        assert_eq!(classify("/tmp/yt-dlp_1/download.WebM").category, MediaCategory::Video);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&MediaCategory::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }
}
