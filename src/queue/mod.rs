//! Queue Module
//!
//! Coalesces concurrent fetches that share a request-group identifier so a
//! slow backend sees one call per group at a time.

mod call;
mod coalesce;

pub use coalesce::Queue;
