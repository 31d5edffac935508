//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming query strings and request bodies.

use serde::Deserialize;

use crate::cache::{Key, Mapping};

/// Maximum number of ids accepted in a single request
pub const MAX_BATCH_SIZE: usize = 1000;

/// Query string for `GET /items` and `DELETE /items`
///
/// # Fields
/// - `ids`: Comma separated item ids, e.g. `1,2,3`
/// - `group`: Optional request-group id; defaults to the raw `ids` string
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsQuery {
    pub ids: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl ItemsQuery {
    /// Parses the id list.
    ///
    /// Returns an error message if the list is empty, too long, or holds a
    /// non-integer id.
    pub fn parse_ids(&self) -> Result<Vec<Key>, String> {
        let ids = self
            .ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Key>()
                    .map_err(|_| format!("Invalid item id '{}'", s))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ids.is_empty() {
            return Err("At least one item id is required".to_string());
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(format!(
                "Too many item ids: {} (max {})",
                ids.len(),
                MAX_BATCH_SIZE
            ));
        }
        Ok(ids)
    }

    /// Request-group id used to coalesce concurrent fetches.
    pub fn group(&self) -> String {
        self.group.clone().unwrap_or_else(|| self.ids.clone())
    }
}

/// Request body for `PUT /items`
#[derive(Debug, Clone, Deserialize)]
pub struct SetItemsRequest {
    /// Values to store, keyed by id
    pub items: Mapping<String>,
}

impl SetItemsRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.items.is_empty() {
            return Some("At least one item is required".to_string());
        }
        if self.items.len() > MAX_BATCH_SIZE {
            return Some(format!("Too many items (max {})", MAX_BATCH_SIZE));
        }
        None
    }
}
