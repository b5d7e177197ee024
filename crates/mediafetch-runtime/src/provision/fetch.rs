//! Streaming release download.

use futures_util::StreamExt;
use mediafetch_core::ProvisionError;
use reqwest::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Download `url` into `dest`, returning the number of bytes written.
///
/// `dest` is created or truncated. On error it may be left partially
/// written; the caller owns its removal.
pub(super) async fn download_to(client: &Client, url: &str, dest: &Path) -> Result<u64, ProvisionError> {
    let fetch_err = |e: reqwest::Error| ProvisionError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let response = client.get(url).send().await.map_err(fetch_err)?;

    if !response.status().is_success() {
        return Err(ProvisionError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut file = File::create(dest)
        .await
        .map_err(|e| ProvisionError::install(dest, e))?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(fetch_err)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ProvisionError::install(dest, e))?;
        downloaded += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| ProvisionError::install(dest, e))?;
    file.sync_all()
        .await
        .map_err(|e| ProvisionError::install(dest, e))?;

    debug!(
        target: "mediafetch.provision",
        url,
        downloaded,
        total_size,
        "Release download finished"
    );

    Ok(downloaded)
}
