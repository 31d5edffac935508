//! Batch Cache - A batched read-through in-memory cache
//!
//! Serves hits locally and resolves misses through a single-flight queue so
//! concurrent callers sharing a request-group id trigger one backend fetch.
//! Entries are bounded by LRU eviction and may expire after a fixed TTL.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod tasks;

pub use api::AppState;
pub use backend::SimulatedBackend;
pub use cache::{CacheStats, CacheStore, Key, Mapping};
pub use config::Config;
pub use error::{CacheError, GetError};
pub use queue::Queue;
pub use tasks::spawn_cleanup_task;
