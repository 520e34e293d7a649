//! Video retrieval: redirect to the stored object, or stream the disk fallback.

use crate::constants::LATEST_VIDEO_SCAN_LIMIT;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{
        header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Redirect, Response},
};
use claiss_core::constants::{VIDEO_CONTENT_TYPE, VIDEO_PREFIX};
use claiss_core::{AppError, ListOptions, StorageObject};
use claiss_storage::{keys, LocalVideo, StorageResult};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    /// Specific video; the most recent one when absent.
    pub id: Option<String>,
}

enum VideoSource {
    Stored(StorageObject),
    Disk(LocalVideo),
}

async fn find_stored(state: &AppState, id: Option<&str>) -> StorageResult<Option<StorageObject>> {
    let adapter = state.storage.adapter().await?;

    match id {
        Some(id) => {
            let listing = adapter
                .list(&ListOptions::prefix(keys::video_key(id)).with_limit(1))
                .await?;
            Ok(listing.blobs.into_iter().next())
        }
        None => {
            let listing = adapter
                .list(&ListOptions::prefix(VIDEO_PREFIX).with_limit(LATEST_VIDEO_SCAN_LIMIT))
                .await?;
            Ok(listing.latest().cloned())
        }
    }
}

/// Storage first; on absence or any storage error, the local disk file.
async fn resolve(state: &AppState, id: Option<&str>) -> Result<VideoSource, HttpAppError> {
    match find_stored(state, id).await {
        Ok(Some(object)) => return Ok(VideoSource::Stored(object)),
        Ok(None) => {
            tracing::debug!(video_id = ?id, "Video not in storage, checking local disk");
        }
        Err(e) => {
            tracing::warn!(video_id = ?id, error = %e, "Storage lookup failed, checking local disk");
        }
    }

    match state.disk.open().await {
        Ok(Some(video)) => Ok(VideoSource::Disk(video)),
        Ok(None) => {
            let message = if id.is_some() {
                "Video not found"
            } else {
                "No videos found"
            };
            Err(HttpAppError(AppError::NotFound(message.to_string())))
        }
        Err(e) => Err(HttpAppError(e.into())),
    }
}

fn video_headers(size: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(VIDEO_CONTENT_TYPE));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoQuery>,
) -> Result<Response, HttpAppError> {
    match resolve(&state, query.id.as_deref()).await? {
        VideoSource::Stored(object) => {
            tracing::debug!(url = %object.url, "Redirecting to stored video");
            Ok(Redirect::temporary(&object.url).into_response())
        }
        VideoSource::Disk(video) => {
            tracing::info!(
                path = %state.disk.path().display(),
                size_bytes = video.size,
                "Serving video from local disk"
            );
            let body = Body::from_stream(ReaderStream::new(video.file));
            Ok((StatusCode::OK, video_headers(video.size), body).into_response())
        }
    }
}

pub async fn head_video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoQuery>,
) -> Result<Response, HttpAppError> {
    let size = match resolve(&state, query.id.as_deref()).await? {
        VideoSource::Stored(object) => object.size,
        VideoSource::Disk(video) => video.size,
    };
    Ok((StatusCode::OK, video_headers(size)).into_response())
}
