use serde::{Deserialize, Serialize};

/// Rows per page on every list screen.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Offset pagination sent to the backend (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(current: u32, page_size: u32) -> Self {
        Self {
            current: current.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.current.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// `ceil(total / page_size)`; zero rows means zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX)
}
