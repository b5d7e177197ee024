//! Media download handlers - `/api/video` and `/api/audio`.

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::HttpError;
use crate::state::AppState;
use mediafetch_core::{DownloadRequest, DownloadedArtifact, MediaKind};

/// Query string accepted by both media endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
    pub url: Option<String>,
    /// Extractor format selector. Blank means the endpoint default.
    pub format: Option<String>,
}

/// Download a video.
pub async fn video(
    State(state): State<AppState>,
    query: Result<Query<MediaQuery>, QueryRejection>,
) -> Result<Response, HttpError> {
    let Query(query) = query?;
    fetch(&state, MediaKind::Video, query).await
}

/// Download audio.
pub async fn audio(
    State(state): State<AppState>,
    query: Result<Query<MediaQuery>, QueryRejection>,
) -> Result<Response, HttpError> {
    let Query(query) = query?;
    fetch(&state, MediaKind::Audio, query).await
}

async fn fetch(state: &AppState, kind: MediaKind, query: MediaQuery) -> Result<Response, HttpError> {
    let request =
        DownloadRequest::from_query(kind, query.url.as_deref(), query.format.as_deref())?;

    tracing::debug!(
        target: "mediafetch.http",
        kind = kind.as_str(),
        url = %request.url(),
        "Media request accepted"
    );

    let artifact = state.downloader.download(request).await?;
    Ok(attachment(artifact))
}

/// Build the file response for a finished download.
fn attachment(artifact: DownloadedArtifact) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&artifact.filename)
    );
    let length = artifact.bytes.len();

    let mut response = Body::from(artifact.bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&artifact.mimetype)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}

/// Restrict a filename to characters that are safe inside a quoted
/// `Content-Disposition` parameter.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}
