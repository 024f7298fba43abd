//! Page requests, page envelopes and sort direction

use crate::error::{AdminError, AdminResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

impl SortDirection {
    /// `ASC`/`DESC` in any case; anything else, or nothing, is DESC
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()) {
            Some(s) if s == "ASC" => SortDirection::Asc,
            Some(s) if s == "DESC" => SortDirection::Desc,
            _ => SortDirection::default(),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated page/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// `page >= 1`, `limit > 0`
    pub fn new(page: i64, limit: i64) -> AdminResult<Self> {
        if page < 1 {
            return Err(AdminError::InvalidPagination(format!(
                "page must be >= 1, got {}",
                page
            )));
        }
        if limit < 1 {
            return Err(AdminError::InvalidPagination(format!(
                "limit must be > 0, got {}",
                limit
            )));
        }

        let page = u32::try_from(page)
            .map_err(|_| AdminError::InvalidPagination(format!("page {} too large", page)))?;
        let limit = u32::try_from(limit)
            .map_err(|_| AdminError::InvalidPagination(format!("limit {} too large", limit)))?;

        Ok(Self { page, limit })
    }

    /// Request values with defaults; `limit` is capped at `max_limit`
    pub fn from_query(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> AdminResult<Self> {
        let mut request = Self::new(page.unwrap_or(1), limit.unwrap_or(default_limit as i64))?;
        request.limit = request.limit.min(max_limit.max(1));
        Ok(request)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// `(page - 1) * limit`
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Paginate rows that are already fully loaded and ordered
    pub fn slice<T>(&self, rows: Vec<T>) -> Page<T> {
        let total = rows.len() as u64;
        let data = rows
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect();
        Page::new(data, total, *self)
    }
}

/// Paginated response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub last_page: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            data,
            total,
            page: request.page,
            limit: request.limit,
            last_page: total.div_ceil(request.limit as u64),
        }
    }
}
