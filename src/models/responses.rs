//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::{CacheStats, Key, Mapping};

/// Response body for `GET /items`
///
/// On a failed fetch `items` holds only the cache hits and `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct ItemsResponse {
    /// Resolved values, ordered by id
    pub items: BTreeMap<Key, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemsResponse {
    pub fn new(items: Mapping<String>) -> Self {
        Self {
            items: items.into_iter().collect(),
            error: None,
        }
    }

    pub fn partial(hits: Mapping<String>, error: impl Into<String>) -> Self {
        Self {
            items: hits.into_iter().collect(),
            error: Some(error.into()),
        }
    }
}

/// Response body for `PUT /items` and `DELETE /items`
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    /// Number of ids written or removed
    pub count: usize,
}

impl WriteResponse {
    pub fn stored(count: usize) -> Self {
        Self {
            message: format!("{} item(s) stored successfully", count),
            count,
        }
    }

    pub fn removed(count: usize) -> Self {
        Self {
            message: format!("{} item(s) removed successfully", count),
            count,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
