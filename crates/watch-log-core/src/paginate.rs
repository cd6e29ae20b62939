// Page slicing and listing state

use chrono::{Local, TimeZone};
use serde::Serialize;
use watch_log_models::WatchedItem;
use crate::filter::{filter_items_in, FilterSpec};
use crate::sort::{sort_items, SortKey, SortOrder};

/// Maximum number of page buttons shown by [`page_window`]
pub const PAGE_WINDOW: usize = 5;

/// One page of a processed list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
    pub total_results: usize,
}

impl<'a, T> Page<'a, T> {
    /// No results at all; callers show an empty state instead of "page 1 of 1"
    pub fn is_empty(&self) -> bool {
        self.total_results == 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Number of pages for `len` items, never less than 1
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Slice out a 1-based page. Page 0 and page size 0 are treated as 1;
/// a page past the end yields an empty slice.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = page.saturating_mul(page_size).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages: total_pages(items.len(), page_size),
        total_results: items.len(),
    }
}

/// Page numbers to show around `current`, at most [`PAGE_WINDOW`] of them
pub fn page_window(current: usize, total: usize) -> Vec<usize> {
    if total <= PAGE_WINDOW {
        return (1..=total).collect();
    }
    let half = PAGE_WINDOW / 2;
    let current = current.clamp(1, total);
    let start = if current <= half + 1 {
        1
    } else if current + half >= total {
        total - PAGE_WINDOW + 1
    } else {
        current - half
    };
    (start..start + PAGE_WINDOW).collect()
}

/// Owned result of a listing pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub items: Vec<WatchedItem>,
    pub page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub window: Vec<usize>,
}

impl ListingView {
    pub fn is_empty(&self) -> bool {
        self.total_results == 0
    }
}

/// Filter, sort and paging choices for one listing.
///
/// Changing the filter, the sort or the page size always goes back to page 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingState {
    filter: FilterSpec,
    sort_key: SortKey,
    sort_order: SortOrder,
    page_size: usize,
    page: usize,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ListingState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: FilterSpec::default(),
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_sort(&mut self, key: SortKey, order: SortOrder) {
        self.sort_key = key;
        self.sort_order = order;
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page += 1;
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Filter → sort → paginate, year predicate in local time
    pub fn view(&self, items: &[WatchedItem]) -> ListingView {
        self.view_in(items, &Local)
    }

    pub fn view_in<Tz: TimeZone>(&self, items: &[WatchedItem], tz: &Tz) -> ListingView {
        let filtered = filter_items_in(items, &self.filter, tz);
        let sorted = sort_items(&filtered, self.sort_key, self.sort_order);
        let page = paginate(&sorted, self.page_size, self.page);
        ListingView {
            items: page.items.to_vec(),
            page: page.page,
            total_pages: page.total_pages,
            total_results: page.total_results,
            window: page_window(page.page, page.total_pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use watch_log_models::MediaKind;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_pages_concatenate_to_input() {
        let items: Vec<u32> = (0..23).collect();
        for page_size in 1..=25 {
            let first = paginate(&items, page_size, 1);
            assert_eq!(first.total_pages, items.len().div_ceil(page_size));
            let rebuilt: Vec<u32> = (1..=first.total_pages)
                .flat_map(|p| paginate(&items, page_size, p).items.to_vec())
                .collect();
            assert_eq!(rebuilt, items, "page_size {}", page_size);
        }
    }

    #[test]
    fn test_out_of_range_and_zero_pages() {
        let items = vec!['a', 'b', 'c'];
        let past_end = paginate(&items, 2, 5);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 2);
        assert!(!past_end.is_empty());

        let zero = paginate(&items, 2, 0);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.items, &['a', 'b']);

        let empty: Vec<char> = Vec::new();
        let page = paginate(&empty, 10, 1);
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 3), vec![1, 2, 3]);
        assert_eq!(page_window(1, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(2, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(3, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(6, 10), vec![4, 5, 6, 7, 8]);
        assert_eq!(page_window(8, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(0, 0), Vec::<usize>::new());
    }

    #[test]
    fn test_listing_state_resets_page() {
        let mut state = ListingState::new(10);
        state.set_page(4);
        state.set_sort(SortKey::Title, SortOrder::Ascending);
        assert_eq!(state.page(), 1);

        state.set_page(3);
        state.set_filter(FilterSpec::default().with_text("x"));
        assert_eq!(state.page(), 1);

        state.set_page(2);
        state.set_page_size(50);
        assert_eq!(state.page(), 1);

        state.previous_page();
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_example_scenario_view() {
        let items = vec![
            WatchedItem::new("a", "A", MediaKind::Movie)
                .with_watched_at(Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap()),
            WatchedItem::new("b", "B", MediaKind::Movie)
                .with_rating(4)
                .with_watched_at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        ];
        let mut state = ListingState::new(10);
        state.set_filter(FilterSpec::default().with_min_rating(1));
        state.set_sort(SortKey::Date, SortOrder::Descending);

        let view = state.view_in(&items, &Utc);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].title, "B");
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.page, 1);
        assert_eq!(view.window, vec![1]);
    }
}
