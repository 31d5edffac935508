//! Request and Response models for the cache service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{ItemsQuery, SetItemsRequest, MAX_BATCH_SIZE};
pub use responses::{HealthResponse, ItemsResponse, StatsResponse, WriteResponse};
