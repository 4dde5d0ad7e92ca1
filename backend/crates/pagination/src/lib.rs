//! Page-number pagination primitives shared by listing endpoints.
//!
//! Listings in the backend are paged by a 1-based page number and a bounded
//! page size. [`PageRequest`] validates those inputs once at the edge and
//! exposes the `LIMIT`/`OFFSET` pair persistence adapters need.
//! [`Page`] is the response envelope carrying the items of one page together
//! with the totals clients use to navigate.
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(2, 10).expect("valid page request");
//! assert_eq!(request.offset(), 10);
//!
//! let page = Page::new(vec!["a", "b"], request, 12);
//! assert_eq!(page.total_pages, 2);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest page size accepted by any listing.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validation failures raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page must be at least 1, got {page}")]
    PageOutOfRange {
        /// Rejected page number.
        page: u32,
    },
    /// Page size must be between one and [`MAX_PAGE_SIZE`].
    #[error("page size must be between 1 and {max}, got {page_size}")]
    PageSizeOutOfRange {
        /// Rejected page size.
        page_size: u32,
        /// Upper bound in force.
        max: u32,
    },
}

/// A validated request for one page of a listing.
///
/// ## Invariants
/// - `page >= 1`
/// - `1 <= page_size <= MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either bound is violated.
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::PageOutOfRange { page });
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PageRequestError::PageSizeOutOfRange {
                page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    /// First page with the given size, clamped into the accepted range.
    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        let clamped = if page_size == 0 {
            1
        } else if page_size > MAX_PAGE_SIZE {
            MAX_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            page: 1,
            page_size: clamped,
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Row limit suitable for an SQL `LIMIT` clause.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Row offset suitable for an SQL `OFFSET` clause.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Raw, unvalidated paging parameters as received from a query string.
///
/// Missing values fall back to page 1 and the caller-supplied default size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    /// Requested page number.
    pub page: Option<u32>,
    /// Requested page size.
    pub page_size: Option<u32>,
}

impl PageParams {
    /// Validate the parameters, substituting defaults for absent values.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when a supplied value is out of range.
    pub fn into_request(self, default_page_size: u32) -> Result<PageRequest, PageRequestError> {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size),
        )
    }
}

/// Number of pages needed to show `total_items` at `page_size` per page.
///
/// ```
/// assert_eq!(pagination::total_pages(0, 20), 0);
/// assert_eq!(pagination::total_pages(41, 20), 3);
/// ```
#[must_use]
pub const fn total_pages(total_items: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size as u64)
}

/// One page of results plus the totals of the full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of items across all pages.
    pub total_items: u64,
    /// `ceil(total_items / page_size)`.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from fetched items and the listing total.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_pages(total_items, request.page_size),
        }
    }

    /// An empty page for a listing with no matching rows.
    #[must_use]
    pub const fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Convert every item while keeping the paging metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
