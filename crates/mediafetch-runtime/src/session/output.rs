//! Locating the file an extractor run produced.

use mediafetch_core::DownloadError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Suffixes of in-progress fragments left behind by the extractor.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// A regular file found in a session directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

fn is_partial(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) || name.contains(".part-Frag")
}

/// Newest file wins; equal timestamps fall back to the smallest name so the
/// choice does not depend on directory iteration order.
pub fn pick(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .filter(|c| !is_partial(&c.name))
        .max_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| b.name.cmp(&a.name))
        })
}

/// List the regular files in `dir`.
pub async fn list_candidates(dir: &Path) -> Result<Vec<Candidate>, DownloadError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::filesystem(dir, &e))?;

    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DownloadError::filesystem(dir, &e))?
    {
        let path = entry.path();
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| DownloadError::filesystem(&path, &e))?;
        if !metadata.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        found.push(Candidate {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            path,
            name,
        });
    }
    Ok(found)
}

/// The produced output file, or [`DownloadError::NoOutputProduced`].
pub async fn select_output(dir: &Path) -> Result<Candidate, DownloadError> {
    pick(list_candidates(dir).await?).ok_or(DownloadError::NoOutputProduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn candidate(name: &str, age_secs: u64) -> Candidate {
        Candidate {
            path: PathBuf::from("/session").join(name),
            name: name.to_string(),
            size: 1,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(1_000 - age_secs),
        }
    }

    #[test]
    fn newest_file_is_selected() {
        let picked = pick(vec![
            candidate("download.f137.mp4", 30),
            candidate("download.mp4", 1),
            candidate("download.f140.m4a", 20),
        ])
        .unwrap();
        assert_eq!(picked.name, "download.mp4");
    }

    #[test]
    fn ties_break_on_smallest_name() {
        let picked = pick(vec![candidate("download.webm", 5), candidate("download.mkv", 5)]).unwrap();
        assert_eq!(picked.name, "download.mkv");
    }

    #[test]
    fn partial_fragments_are_ignored() {
        let picked = pick(vec![
            candidate("download.mp4.part", 0),
            candidate("download.mp4.ytdl", 0),
            candidate("download.f137.mp4.part-Frag3", 0),
            candidate("download.mp3", 10),
        ])
        .unwrap();
        assert_eq!(picked.name, "download.mp3");
    }

    #[test]
    fn nothing_to_pick() {
        assert!(pick(Vec::new()).is_none());
        assert!(pick(vec![candidate("download.webm.part", 0)]).is_none());
    }

    #[tokio::test]
    async fn lists_only_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("download.mp3"), b"abc").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let found = list_candidates(dir.path()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "download.mp3");
        assert_eq!(found[0].size, 3);
    }

    #[tokio::test]
    async fn empty_directory_means_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = select_output(dir.path()).await.unwrap_err();
        assert!(matches!(err, DownloadError::NoOutputProduced));
    }
}
