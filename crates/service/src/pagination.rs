//! Pagination utilities for service layer
//!
//! Offset/limit window as accepted by list endpoints (`?skip=&limit=`).

use serde::Deserialize;

pub const MAX_LIMIT: u64 = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// rows to skip
    #[serde(default)]
    pub skip: u64,
    /// rows to return
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 { MAX_LIMIT }

impl Pagination {
    /// Clamp `limit` into `1..=100` and return `(offset, limit)`.
    pub fn normalize(self) -> (u64, u64) {
        (self.skip, self.limit.clamp(1, MAX_LIMIT))
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { skip: 0, limit: default_limit() } }
}
