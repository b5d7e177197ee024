//! Axum-specific error types and mappings.
//!
//! Maps `DownloadError` to HTTP status codes and a JSON body of the form
//! `{"error": "...", "status": 502, "type": "EXTRACTION_FAILED"}`.

use axum::extract::rejection::QueryRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use mediafetch_core::DownloadError;
use serde::Serialize;
use thiserror::Error;

/// Seconds a saturated server asks clients to wait before retrying.
pub const RETRY_AFTER_SECS: u64 = 5;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A download pipeline failure.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// A query string axum could not deserialize (duplicated or malformed
/// keys) is bad input like any other.
impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Download(DownloadError::invalid_input(rejection.body_text()))
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
    /// Stable error type discriminant for client-side handling
    #[serde(rename = "type")]
    pub error_type: &'static str,
}

impl HttpError {
    /// Status code for this error.
    pub const fn status(&self) -> StatusCode {
        let Self::Download(err) = self;
        match err {
            DownloadError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DownloadError::Provisioning(_) | DownloadError::Filesystem { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            DownloadError::Extraction(_) | DownloadError::NoOutputProduced => {
                StatusCode::BAD_GATEWAY
            }
            DownloadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DownloadError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DownloadError::TooBusy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    const fn error_type(&self) -> &'static str {
        let Self::Download(err) = self;
        err.kind()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(target: "mediafetch.http", status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(target: "mediafetch.http", status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
            error_type: self.error_type(),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if matches!(self, Self::Download(DownloadError::TooBusy)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediafetch_core::ProvisionError;
    use std::path::PathBuf;
    use std::time::Duration;

    fn status_of(err: DownloadError) -> StatusCode {
        HttpError::from(err).status()
    }

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(
            status_of(DownloadError::invalid_input("Invalid URL provided")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ProvisionError::NotFound(PathBuf::from("/x")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DownloadError::Extraction("exit 1".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(DownloadError::NoOutputProduced),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(DownloadError::TooLarge { size: 2, limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(DownloadError::Timeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(DownloadError::TooBusy),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn too_busy_carries_retry_after() {
        let response = HttpError::from(DownloadError::TooBusy).into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "5");

        let response = HttpError::from(DownloadError::NoOutputProduced).into_response();
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn body_uses_display_message_and_kind() {
        let body = ErrorBody {
            error: HttpError::from(DownloadError::Extraction("boom".into())).to_string(),
            status: 502,
            error_type: "EXTRACTION_FAILED",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Download failed: boom");
        assert_eq!(json["type"], "EXTRACTION_FAILED");
        assert_eq!(json["status"], 502);
    }
}
