pub mod activity;
pub mod approval;
pub mod approval_history;
pub mod master;
pub mod menu;
pub mod permission;
pub mod reset_token;
pub mod role;
pub mod user;

/// Common list-query shape shared by every paginated repository call.
/// `page` is 1-based; `rows` is the page size.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: u64,
    pub rows: u64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub ascending: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            rows: 20,
            search: None,
            sort_by: None,
            ascending: true,
        }
    }
}
