use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::db::PageRequest;

/// Uniform envelope for every non-list endpoint:
/// `{status, message, data}` with `status` mirroring the HTTP code.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: 201,
            message: "created".to_string(),
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Query parameters accepted by every list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub rows: Option<u64>,
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// true = ascending, false = descending
    #[serde(rename = "sortDirection")]
    pub sort_direction: Option<bool>,
}

impl ListQuery {
    pub fn into_page_request(self) -> PageRequest {
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            rows: self.rows.unwrap_or(20).clamp(1, 1000),
            search,
            sort_by: self.sort_by,
            ascending: self.sort_direction.unwrap_or(true),
        }
    }
}

/// List envelope: `{items, pagination}` with no outer wrapper.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, req: &PageRequest, total_rows: u64) -> Self {
        let pagination = PageInfo::new(req.page, req.rows, total_rows);
        Self { items, pagination }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u64,
    pub next_page: Option<u64>,
    pub total_pages: u64,
    pub rows_per_page: u64,
    pub total_rows: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl PageInfo {
    #[must_use]
    pub fn new(page: u64, rows: u64, total_rows: u64) -> Self {
        let total_pages = total_rows.div_ceil(rows);
        let first = (page - 1) * rows + 1;

        let (from, to) = if first <= total_rows {
            (Some(first), Some((page * rows).min(total_rows)))
        } else {
            (None, None)
        };

        Self {
            current_page: page,
            next_page: (page < total_pages).then_some(page + 1),
            total_pages,
            rows_per_page: rows,
            total_rows,
            from,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_a_full_middle_page() {
        let info = PageInfo::new(2, 20, 45);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.next_page, Some(3));
        assert_eq!(info.from, Some(21));
        assert_eq!(info.to, Some(40));
    }

    #[test]
    fn last_page_is_truncated_and_has_no_next() {
        let info = PageInfo::new(3, 20, 45);
        assert_eq!(info.next_page, None);
        assert_eq!(info.from, Some(41));
        assert_eq!(info.to, Some(45));
    }

    #[test]
    fn empty_result_set_has_null_bounds() {
        let info = PageInfo::new(1, 20, 0);
        assert_eq!(info.total_pages, 0);
        assert_eq!(info.next_page, None);
        assert_eq!(info.from, None);
        assert_eq!(info.to, None);
    }

    #[test]
    fn page_past_the_end_has_null_bounds() {
        let info = PageInfo::new(9, 20, 45);
        assert_eq!(info.from, None);
        assert_eq!(info.to, None);
    }
}
