//! Todo ordering and pagination.

use std::cmp::Ordering;

use serde::Serialize;

use crate::todo::{TodoItem, TodoStatus};

/// Items shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 5;

fn severity_rank(status: TodoStatus) -> u8 {
    match status {
        TodoStatus::Red => 0,
        TodoStatus::Yellow | TodoStatus::Retest => 1,
    }
}

/// Canonical todo ordering: red first, then ascending `field`.
pub fn compare_todos(a: &TodoItem, b: &TodoItem) -> Ordering {
    severity_rank(a.status)
        .cmp(&severity_rank(b.status))
        .then_with(|| a.field.cmp(&b.field))
}

/// Sorts in place. Stable, so equal items keep their insertion order.
pub fn sort_todos(items: &mut [TodoItem]) {
    items.sort_by(compare_todos);
}

/// Returns a sorted copy.
pub fn sorted_todos(items: &[TodoItem]) -> Vec<TodoItem> {
    let mut sorted = items.to_vec();
    sort_todos(&mut sorted);
    sorted
}

/// One pagination marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageDot {
    /// 1-based page number.
    pub page: usize,
    pub active: bool,
}

/// Red versus everything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorCounts {
    pub red: usize,
    pub other: usize,
}

impl IndicatorCounts {
    pub fn total(&self) -> usize {
        self.red + self.other
    }
}

pub fn indicator_counts(items: &[TodoItem]) -> IndicatorCounts {
    items.iter().fold(IndicatorCounts::default(), |mut acc, item| {
        if item.is_red() {
            acc.red += 1;
        } else {
            acc.other += 1;
        }
        acc
    })
}

/// Fixed-size page view over a todo list.
///
/// The pager owns only the page number; item counts are passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoPager {
    page: usize,
    page_size: usize,
}

impl Default for TodoPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TodoPager {
    /// A zero page size is treated as 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Current page, clamped to the last page that has items.
    pub fn effective_page(&self, total: usize) -> usize {
        self.page.clamp(1, self.page_count(total).max(1))
    }

    /// Slice of already-sorted items for the current page.
    pub fn paginate<'a>(&self, sorted: &'a [TodoItem]) -> &'a [TodoItem] {
        let page = self.effective_page(sorted.len());
        let start = ((page - 1) * self.page_size).min(sorted.len());
        let end = (start + self.page_size).min(sorted.len());
        &sorted[start..end]
    }

    /// Moves one page forward or back; requests past either end are ignored.
    pub fn switch_page(&mut self, forward: bool, total: usize) -> usize {
        if forward && self.page * self.page_size < total {
            self.page += 1;
        } else if !forward && self.page != 1 {
            self.page -= 1;
        }
        self.page
    }

    /// Jumps to `page`, clamped into the valid range.
    pub fn set_page(&mut self, page: usize, total: usize) -> usize {
        self.page = page.clamp(1, self.page_count(total).max(1));
        self.page
    }

    /// One marker per page.
    pub fn dots(&self, total: usize) -> Vec<PageDot> {
        let active = self.effective_page(total);
        (1..=self.page_count(total))
            .map(|page| PageDot {
                page,
                active: page == active,
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}
