//! Retrieval routes.

use std::path::Path as FsPath;

use axum::Router;
use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::MOBI_CONTENT_TYPE;
use super::error::{ApiError, ApiResult};
use super::server::AppState;
use crate::Error;

/// Create the retrieval router. Anything that is not `/{slug}` is a 404.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(get_artifact))
        .fallback(not_found)
}

/// Stream the artifact registered under `slug`.
async fn get_artifact(
    State(state): State<AppState>,
    slug: Result<Path<String>, PathRejection>,
) -> ApiResult<Response> {
    // Undecodable slugs can never be registered.
    let Path(slug) = slug.map_err(|e| {
        debug!(error = %e, "Rejecting malformed slug");
        ApiError::not_found()
    })?;
    let path = state.registry.lookup(&slug)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| Error::io_path("opening", &path, e))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| Error::io_path("reading metadata of", &path, e))?
        .len();

    debug!(slug = %slug, path = %path.display(), len, "Serving artifact");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, MOBI_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, content_disposition(&path))
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal()
        })
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// `attachment; filename=<name>` for the artifact's base name.
///
/// Header values must be visible ASCII, so non-ASCII names get an ASCII
/// fallback plus an RFC 5987 `filename*` parameter.
pub fn content_disposition(path: &FsPath) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if name.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return format!("attachment; filename={name}");
    }

    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename={fallback}; filename*=UTF-8''{}",
        urlencoding::encode(&name)
    )
}
