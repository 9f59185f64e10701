pub mod admin;
pub mod applications;
pub mod health;
pub mod items;

use serde::Deserialize;
use utoipa::IntoParams;

/// Common pagination query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size (max 1000)
    pub per_page: Option<u64>,
    /// Optional status filter (admin application listing)
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(20)
    }
}
