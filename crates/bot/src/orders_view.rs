//! Admin orders list view state.
//!
//! Filter, sort, and pagination settings for the orders list. The struct
//! is serialized into the admin's session scratch data, so two admins (or
//! one admin in two chats) page through orders independently.

use serde::{Deserialize, Serialize};

use greengrocer_core::{Order, OrderStatus};

/// Which orders the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderFilter {
    /// Every order.
    All,
    /// Orders still needing attention (status other than completed).
    Open,
    /// Completed orders only.
    Completed,
}

impl OrderFilter {
    /// Wire tag used in callback payloads.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "new",
            Self::Completed => "completed",
        }
    }

    /// Whether an order passes the filter.
    #[must_use]
    pub const fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Open => status.is_open(),
            Self::Completed => matches!(status, OrderStatus::Completed),
        }
    }
}

/// Sort key for the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortKey {
    /// By creation time.
    Date,
    /// By customer ID.
    User,
}

impl OrderSortKey {
    /// Wire tag used in callback payloads.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::User => "user",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Allowed page sizes.
pub const PAGE_SIZES: [usize; 2] = [10, 20];

/// One admin session's orders list settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersQuery {
    /// Active filter.
    pub filter: OrderFilter,
    /// Active sort key.
    pub sort_key: OrderSortKey,
    /// Active sort direction.
    pub direction: SortDirection,
    /// 1-based page number.
    pub page: usize,
    /// Orders per page.
    pub page_size: usize,
}

impl Default for OrdersQuery {
    fn default() -> Self {
        Self {
            filter: OrderFilter::All,
            sort_key: OrderSortKey::Date,
            direction: SortDirection::Desc,
            page: 1,
            page_size: 10,
        }
    }
}

/// One rendered page of the list.
#[derive(Debug)]
pub struct OrdersPage<'a> {
    /// Orders on this page, already filtered and sorted.
    pub orders: Vec<&'a Order>,
    /// Effective (clamped) page number.
    pub page: usize,
    /// Total page count, at least 1.
    pub total_pages: usize,
    /// Total orders passing the filter.
    pub total_orders: usize,
}

impl OrdersQuery {
    /// Switch the filter. Returns `false` when the filter is already
    /// active, so the caller can skip a redundant re-render.
    pub fn set_filter(&mut self, filter: OrderFilter) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.page = 1;
        true
    }

    /// Select a sort key. Re-selecting the active key flips the
    /// direction; switching keys resets to descending.
    pub fn select_sort(&mut self, key: OrderSortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flipped();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Desc;
        }
        self.page = 1;
    }

    /// Switch the page size, keeping the view anchored near the first
    /// item of the old page. Unknown sizes are ignored.
    pub fn set_page_size(&mut self, size: usize) {
        if !PAGE_SIZES.contains(&size) || size == self.page_size {
            return;
        }
        let first_item = (self.page - 1) * self.page_size;
        self.page = first_item / size + 1;
        self.page_size = size;
    }

    /// Move one page back, if possible.
    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    /// Move one page forward, bounded by `total_pages`.
    pub fn next_page(&mut self, total_pages: usize) {
        if self.page < total_pages {
            self.page += 1;
        }
    }

    /// Filter, sort, clamp the page into range, and slice out one page.
    ///
    /// An empty result still reports one (empty) page so the screen can
    /// render `1/1`.
    pub fn apply<'a>(&mut self, orders: &'a [Order]) -> OrdersPage<'a> {
        let mut selected: Vec<&Order> = orders
            .iter()
            .filter(|o| self.filter.matches(o.status))
            .collect();

        selected.sort_by(|a, b| {
            let ordering = match self.sort_key {
                OrderSortKey::Date => a.created_at.cmp(&b.created_at),
                OrderSortKey::User => a.user_id.cmp(&b.user_id).then(a.id.cmp(&b.id)),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total_orders = selected.len();
        let total_pages = total_orders.div_ceil(self.page_size).max(1);
        self.page = self.page.clamp(1, total_pages);

        let start = (self.page - 1) * self.page_size;
        let page_orders = selected
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect();

        OrdersPage {
            orders: page_orders,
            page: self.page,
            total_pages,
            total_orders,
        }
    }
}
