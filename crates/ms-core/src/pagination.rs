//! Lenient page-number resolution for listings.
//!
//! A missing or garbled `?page=` falls back to the first page, and a number
//! outside `1..=num_pages` falls back to the last one, so a listing request
//! never fails because of its page parameter.

use serde::Serialize;

/// Items per listing page.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

impl Paginator {
    pub fn new(total: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// There is always at least one (possibly empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn resolve(&self, raw: Option<&str>) -> i64 {
        match raw.and_then(|r| r.trim().parse::<i64>().ok()) {
            None => 1,
            Some(n) if n < 1 || n > self.num_pages() => self.num_pages(),
            Some(n) => n,
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self, number: i64) -> i64 {
        (number - 1) * self.per_page
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            total: self.total,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Paginator::new(0, PAGE_SIZE).page(1, Vec::new())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_garbled_page_is_first() {
        let p = Paginator::new(35, 10);
        assert_eq!(p.resolve(None), 1);
        assert_eq!(p.resolve(Some("abc")), 1);
        assert_eq!(p.resolve(Some("")), 1);
    }

    #[test]
    fn out_of_range_page_is_last() {
        let p = Paginator::new(35, 10);
        assert_eq!(p.num_pages(), 4);
        assert_eq!(p.resolve(Some("9")), 4);
        assert_eq!(p.resolve(Some("0")), 4);
        assert_eq!(p.resolve(Some("-2")), 4);
        assert_eq!(p.resolve(Some(" 3 ")), 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let p = Paginator::new(0, 10);
        assert_eq!(p.num_pages(), 1);
        assert_eq!(p.resolve(Some("5")), 1);

        let page: Page<u8> = Page::empty();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn page_flags_and_offsets() {
        let p = Paginator::new(21, 10);
        assert_eq!(p.offset(3), 20);
        let page = p.page(2, vec![1, 2]);
        assert!(page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.map(|n| n * 10).items, vec![10, 20]);
    }
}
