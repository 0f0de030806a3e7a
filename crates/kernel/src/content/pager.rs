//! Page-number pagination for post listings.
//!
//! Page numbers are 1-indexed. Resolution is lenient: a missing or
//! non-integer page parameter falls back to the first page, and an integer
//! outside the valid range falls back to the last page.

use serde::Serialize;

/// Fixed page size of the public post listing.
pub const POSTS_PER_PAGE: u32 = 5;

/// Page arithmetic over a known total count.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

impl Paginator {
    /// Create a paginator over `count` items, `per_page` per page.
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Items per page.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of pages. An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> u32 {
        if self.count == 0 {
            return 1;
        }
        let per_page = u64::from(self.per_page);
        let pages = self.count.div_ceil(per_page);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve a raw `page` query value to a valid page number.
    pub fn resolve(&self, raw: Option<&str>) -> u32 {
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return 1;
        }

        let last = self.num_pages();
        // Too large for i64 is still an integer, just out of range
        let Ok(number) = raw.parse::<i64>() else {
            return last;
        };
        if number < 1 || number > i64::from(last) {
            return last;
        }
        // In range, so it fits in u32
        u32::try_from(number).unwrap_or(last)
    }

    /// Row offset of the first item on `page`.
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Wrap the items of `page` with navigation metadata.
    pub fn page<T>(&self, items: Vec<T>, number: u32) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then_some(number + 1),
            previous_page_number: (number > 1).then(|| number - 1),
            page_range: (1..=num_pages).collect(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Current page number (1-indexed).
    pub number: u32,
    pub num_pages: u32,
    /// Total count across all pages.
    pub count: u64,
    pub per_page: u32,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u32>,
    pub previous_page_number: Option<u32>,
    pub page_range: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_items_make_three_pages() {
        let paginator = Paginator::new(12, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 3);
        assert_eq!(paginator.offset(3), 10);

        let page = paginator.page(vec![11, 12], 3);
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.previous_page_number, Some(2));
        assert_eq!(page.page_range, vec![1, 2, 3]);
    }

    #[test]
    fn exact_multiple_has_no_partial_page() {
        assert_eq!(Paginator::new(10, 5).num_pages(), 2);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let paginator = Paginator::new(0, 5);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.resolve(Some("4")), 1);
        let page = paginator.page(Vec::<u8>::new(), 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn missing_or_non_integer_page_is_first() {
        let paginator = Paginator::new(12, 5);
        assert_eq!(paginator.resolve(None), 1);
        assert_eq!(paginator.resolve(Some("abc")), 1);
        assert_eq!(paginator.resolve(Some("2.5")), 1);
        assert_eq!(paginator.resolve(Some("")), 1);
    }

    #[test]
    fn out_of_range_page_is_last() {
        let paginator = Paginator::new(12, 5);
        assert_eq!(paginator.resolve(Some("99")), 3);
        assert_eq!(paginator.resolve(Some("0")), 3);
        assert_eq!(paginator.resolve(Some("-1")), 3);
        assert_eq!(paginator.resolve(Some("+7")), 3);
    }

    #[test]
    fn overflowing_page_is_last() {
        let paginator = Paginator::new(12, 5);
        assert_eq!(paginator.resolve(Some("99999999999999999999")), 3);
        assert_eq!(paginator.resolve(Some("-99999999999999999999")), 3);
        assert_eq!(paginator.resolve(Some("-")), 1);
        assert_eq!(paginator.resolve(Some("1e3")), 1);
    }

    #[test]
    fn valid_page_is_kept() {
        let paginator = Paginator::new(12, 5);
        assert_eq!(paginator.resolve(Some("2")), 2);
        assert_eq!(paginator.resolve(Some(" 3 ")), 3);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let paginator = Paginator::new(3, 0);
        assert_eq!(paginator.per_page(), 1);
        assert_eq!(paginator.num_pages(), 3);
    }
}
