//! Pagination and sort descriptors handed to the store.

use crate::error::{Error, Result};
use crate::sort::{SortDirection, SortField};
use serde::{Deserialize, Serialize};

/// Message used when a page request has a zero size.
pub const INVALID_PAGE_SIZE: &str = "INVALID_PAGE_SIZE";

/// Store-level ordering: a literal field name plus a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// Ordering by an already validated registry field.
    pub fn by(field: SortField, direction: SortDirection) -> Self {
        Sort {
            field: field.field_name().to_string(),
            direction,
        }
    }
}

/// Zero-based page index and a positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    /// Create a page request.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadRequest` if `size` is zero.
    pub fn new(page: usize, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::BadRequest(INVALID_PAGE_SIZE.to_string()));
        }
        Ok(PageRequest { page, size })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Index of the first element on this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// Query descriptor consumed by [`Store::find_all_paged`](crate::repository::Store::find_all_paged).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageQuery {
    pub request: PageRequest,
    pub sort: Option<Sort>,
}

impl PageQuery {
    /// Unsorted page.
    pub fn unsorted(request: PageRequest) -> Self {
        PageQuery {
            request,
            sort: None,
        }
    }

    /// Translate a validated field, a direction and a page into a descriptor.
    pub fn sorted(field: SortField, direction: SortDirection, request: PageRequest) -> Self {
        PageQuery {
            request,
            sort: Some(Sort::by(field, direction)),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Build a page from its content and the total number of matching rows.
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = request.size() as u64;
        Page {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Slice a complete, already ordered result set.
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let content = all
            .into_iter()
            .skip(request.offset())
            .take(request.size())
            .collect();
        Page::new(content, request, total)
    }

    /// Convert every element, keeping the paging metadata.
    pub fn try_map<U, F>(self, f: F) -> Result<Page<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        let content = self.content.into_iter().map(f).collect::<Result<Vec<U>>>()?;
        Ok(Page {
            content,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        })
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        (self.page as u64) + 1 < self.total_pages
    }
}
