//! Page-number pagination.
//!
//! Polar list endpoints take `page` (1-based) and `limit` query parameters and
//! answer with:
//!
//! ```json
//! {"items": [...], "pagination": {"total_count": 42, "max_page": 5}}
//! ```
//!
//! [`paginate`] turns a page-fetching closure into a lazy [`Stream`] over every
//! item of every page.

use std::collections::VecDeque;
use std::future::Future;

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};

use crate::error::{PolarError, PolarResult};

/// Largest `limit` accepted by the API.
pub const MAX_PAGE_LIMIT: u32 = 100;
/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Pagination metadata of a list response.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    /// Number of items across all pages
    #[serde(default)]
    pub total_count: u64,
    /// Last page number (0 when there are no items)
    #[serde(default)]
    pub max_page: u32,
}

/// One page of a list endpoint.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
pub struct ListResource<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl<T> ListResource<T> {
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }

    /// Whether a page after `page` exists.
    pub fn has_next(&self, page: u32) -> bool {
        !self.items.is_empty() && page < self.pagination.max_page
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for ListResource<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// `page` / `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// Page number, starting at 1
    pub page: u32,
    /// Items per page, 1 to [`MAX_PAGE_LIMIT`]
    pub limit: u32,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn first(limit: u32) -> Self {
        Self { page: 1, limit }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            limit: self.limit,
        }
    }

    pub fn validate(&self) -> PolarResult<()> {
        if self.page == 0 {
            return Err(PolarError::invalid("page", "must be at least 1"));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(PolarError::invalid(
                "limit",
                format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            ));
        }
        Ok(())
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_LIMIT)
    }
}

struct PaginationState<T, F> {
    fetch: F,
    next: Option<PageParams>,
    buffer: VecDeque<T>,
}

/// Lazily walk every page, yielding items one at a time.
///
/// Pages are fetched on demand starting at page 1. The stream ends after the
/// last page (`page >= max_page`) or an empty page. If a fetch fails, the
/// error is yielded once and the stream ends.
pub fn paginate<T, F, Fut>(limit: u32, fetch: F) -> impl Stream<Item = PolarResult<T>>
where
    F: FnMut(PageParams) -> Fut,
    Fut: Future<Output = PolarResult<ListResource<T>>>,
{
    let state = PaginationState {
        fetch,
        next: Some(PageParams::first(limit)),
        buffer: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.buffer.pop_front() {
                return Some((Ok(item), state));
            }

            let params = state.next.take()?;
            match (state.fetch)(params).await {
                Ok(page) => {
                    if page.has_next(params.page) {
                        state.next = Some(params.next());
                    }
                    state.buffer.extend(page.items);
                }
                Err(e) => return Some((Err(e), state)),
            }
        }
    })
}
