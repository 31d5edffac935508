//! Error types for the batch cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::Mapping;

// == Cache Error Enum ==
/// Unified error type for the batch cache.
///
/// The store and the queue only ever produce `FetchFailed`; the other
/// variants come from the HTTP layer.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The fetch function reported an error (shared by every coalesced caller)
    #[error("Fetch failed: {0}")]
    FetchFailed(Arc<anyhow::Error>),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps a fetch function failure.
    pub fn fetch_failed(err: anyhow::Error) -> Self {
        CacheError::FetchFailed(Arc::new(err))
    }
}

// == Get Error ==
/// Failure of a batched `get`: the fetch for the missing keys failed.
///
/// `hits` holds whatever was already resolved from the cache. The missing
/// keys are absent from it and were not stored.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct GetError<V> {
    /// Keys served from the cache before the fetch failed
    pub hits: Mapping<V>,
    /// The fetch failure
    #[source]
    pub source: CacheError,
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the batch cache.
pub type Result<T> = std::result::Result<T, CacheError>;
