// =============================================================================
// PAGINATION MODULE
// =============================================================================
// Page cursor for a store. Invariants:
// - page >= 1 and page <= page_count() after every total change
// - page_size > 0
// =============================================================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    /// Number of pages; an empty collection still has one (empty) page.
    pub fn page_count(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Records a new total and pulls `page` back into range.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.page_size = self.page_size.max(1);
        self.page = self.page.clamp(1, self.page_count());
    }

    /// Back to the first page, keeping size and total.
    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Zero-based offset of the first row on the current page.
    pub fn offset(&self) -> usize {
        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        let mut p = PaginationState::new(10);
        assert_eq!(p.page_count(), 1);
        p.set_total(10);
        assert_eq!(p.page_count(), 1);
        p.set_total(11);
        assert_eq!(p.page_count(), 2);
    }

    #[test]
    fn test_total_change_clamps_page() {
        let mut p = PaginationState::new(10);
        p.total = 100;
        p.page = 7;
        p.set_total(25);
        assert_eq!(p.page, 3);
        p.set_total(0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_zero_page_is_lifted() {
        let mut p = PaginationState {
            page: 0,
            page_size: 0,
            total: 5,
        };
        p.clamp();
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
        assert_eq!(p.offset(), 0);
        assert!(p.has_next());
        assert!(!p.has_previous());
    }
}
