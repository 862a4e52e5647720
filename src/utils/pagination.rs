use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: u64 = 5;
pub const MAX_PAGE_SIZE: u64 = 100;

/// `?page=&size=` as sent by clients; zero or missing means "use defaults".
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    /// Fails when the page lies beyond any offset the database can address.
    pub fn new(page: u64, size: u64) -> AppResult<Self> {
        if page == 0 || size == 0 {
            return Ok(Self::default());
        }

        let size = size.min(MAX_PAGE_SIZE);
        match page.checked_mul(size) {
            Some(end) if end <= i64::MAX as u64 => Ok(Self { page, size }),
            _ => Err(AppError::BadRequest(format!("Page {} is out of range", page))),
        }
    }

    /// Zero-based page index for sea-orm paginators.
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TryFrom<PageQuery> for PageRequest {
    type Error = AppError;

    fn try_from(query: PageQuery) -> AppResult<Self> {
        Self::new(query.page.unwrap_or(0), query.size.unwrap_or(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paging {
    pub page: u64,
    pub rows_per_page: u64,
    pub total_rows: u64,
    pub total_pages: u64,
}

impl Paging {
    pub fn new(request: PageRequest, total_rows: u64) -> Self {
        Self {
            page: request.page,
            rows_per_page: request.size,
            total_rows,
            total_pages: total_rows.div_ceil(request.size),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub paging: Paging,
}

impl<T> Paged<T> {
    pub fn new(data: Vec<T>, paging: Paging) -> Self {
        Self { data, paging }
    }
}
