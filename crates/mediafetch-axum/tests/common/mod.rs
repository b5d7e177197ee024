//! Shared helpers for mediafetch-axum tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use mediafetch_axum::{AxumContext, CorsConfig, create_router};
use mediafetch_core::{
    DownloadError, DownloadRequest, DownloadedArtifact, MediaCategory, MediaDownloaderPort,
};
use mockall::mock;
use tower::ServiceExt;

mock! {
    pub Downloader {}

    #[async_trait]
    impl MediaDownloaderPort for Downloader {
        async fn download(
            &self,
            request: DownloadRequest,
        ) -> Result<DownloadedArtifact, DownloadError>;
    }
}

/// Router backed by the given mock.
pub fn router(mock: MockDownloader) -> Router {
    create_router(AxumContext::new(Arc::new(mock)), &CorsConfig::AllowAll)
}

pub fn mp4_artifact() -> DownloadedArtifact {
    DownloadedArtifact {
        bytes: b"\x00\x00\x00\x18ftypmp42".to_vec(),
        mimetype: "video/mp4".to_string(),
        filename: "download.mp4".to_string(),
        category: MediaCategory::Video,
    }
}

/// Issue a GET request against `app`.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
