//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `GET /items?ids=1,2&group=g` - Batched read-through lookup
//! - `PUT /items` - Store values
//! - `DELETE /items?ids=1,2` - Remove ids
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
