use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One row per handled request. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SiteVisit {
    pub id: i64,
    pub ip: String,
    /// Set when the request carried a valid bearer token.
    pub user_id: Option<i64>,
    pub visited_at: DateTime<Utc>,
}
