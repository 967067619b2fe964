//! `limit`/`offset` parsing and the page-plus-count helper shared by listings.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, sqlite::SqliteRow};

use crate::error::AppError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw `limit`/`offset` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PaginationParams {
    pub fn parse(&self) -> Result<Pagination, AppError> {
        Pagination::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

/// A validated window: `limit` rows starting at row `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Absent parameters take their defaults; present ones must be decimal
    /// integers >= 0, and `limit` may not exceed `MAX_LIMIT`.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Result<Self, AppError> {
        let limit = parse_param("limit", limit, DEFAULT_LIMIT)?;
        let offset = parse_param("offset", offset, 0)?;

        if limit > MAX_LIMIT {
            return Err(AppError::BadRequest(format!(
                "limit must be at most {MAX_LIMIT}"
            )));
        }

        Ok(Self { limit, offset })
    }
}

fn parse_param(name: &str, value: Option<&str>, default: i64) -> Result<i64, AppError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest(format!("{name} must not be empty")));
    }
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!(
            "{name} must be a non-negative integer"
        ))),
    }
}

/// One page of rows plus the total number of matching rows.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: i64,
}

/// Pieces of a listing query.
///
/// `select`, `from`, `id_column` and `order_by` are trusted SQL fragments
/// written in this crate; only `filter`'s value is bound.
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'a> {
    pub select: &'a str,
    pub from: &'a str,
    /// Primary-table id, counted by the count query.
    pub id_column: &'a str,
    /// Optional `column = value` restriction.
    pub filter: Option<(&'a str, i64)>,
    pub order_by: Option<&'a str>,
}

impl ListQuery<'_> {
    fn push_filter(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some((column, value)) = self.filter {
            qb.push(" WHERE ");
            qb.push(column);
            qb.push(" = ");
            qb.push_bind(value);
        }
    }

    /// The count statement: same source and filter, no ordering, only the id.
    fn count_builder(&self) -> QueryBuilder<'_, Sqlite> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT COUNT({}) FROM {}",
            self.id_column, self.from
        ));
        self.push_filter(&mut qb);
        qb
    }

    fn page_builder(&self, page: Pagination) -> QueryBuilder<'_, Sqlite> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", self.select, self.from));
        self.push_filter(&mut qb);
        if let Some(order_by) = self.order_by {
            qb.push(" ORDER BY ");
            qb.push(order_by);
        }
        qb.push(" LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset);
        qb
    }
}

/// Fetches one page of `query` and the total count of rows it matches.
pub async fn paginate_and_count<T>(
    pool: &SqlitePool,
    query: &ListQuery<'_>,
    page: Pagination,
) -> Result<Page<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let data = query
        .page_builder(page)
        .build_query_as::<T>()
        .fetch_all(pool)
        .await?;

    let count: i64 = query
        .count_builder()
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    Ok(Page { data, count })
}
