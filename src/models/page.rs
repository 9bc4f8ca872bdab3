use serde::{Deserialize, Serialize};

/// Default number of movies per page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// 1-based pagination window shared by the store and the search index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Build a page request, flooring both values at 1.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: floor_at_one(page),
            page_size: floor_at_one(page_size),
        }
    }

    /// Number of rows to skip
    pub fn skip(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// Number of rows to take
    pub fn take(&self) -> usize {
        self.page_size as usize
    }

    /// Same page, with the page size capped at `max`
    pub fn capped(self, max: u32) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.min(max.max(1)),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn floor_at_one(value: i64) -> u32 {
    value.clamp(1, u32::MAX as i64) as u32
}
