//! Offset pagination shared by the listing endpoints.

use serde::Deserialize;

/// Default page size for listings.
pub const DEFAULT_LIMIT: usize = 100;

/// `?skip=&limit=` over an implementation-defined stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Pagination {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }

    /// Applies the page to an ordered iterator.
    pub fn apply<I: IntoIterator>(self, items: I) -> impl Iterator<Item = I::Item> {
        items.into_iter().skip(self.skip).take(self.limit)
    }

    /// `OFFSET` bind value, saturating at `i64::MAX`.
    pub fn sql_offset(self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }

    /// `LIMIT` bind value, saturating at `i64::MAX`.
    pub fn sql_limit(self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}
