//! Categories and tags. Both are named labels attached to recipes through a
//! join table, so they share one row type and one set of queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row of the 'categories' or 'tags' table.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct TaxonomyItem {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Names are trimmed before validation, so a blank name is rejected rather
/// than stored as "".
#[derive(Debug, Deserialize, Validate)]
pub struct TaxonomyRequest {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
}

impl TaxonomyRequest {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

/// Query string of the category/tag listings.
#[derive(Debug, Default, Deserialize)]
pub struct TaxonomyListParams {
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Ordering of category/tag listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    CreatedAsc,
    CreatedDesc,
    /// Store order (by id).
    Natural,
}

impl SortOrder {
    /// Unknown or empty values fall back to natural order.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("name_asc") => SortOrder::NameAsc,
            Some("name_desc") => SortOrder::NameDesc,
            Some("created_asc") => SortOrder::CreatedAsc,
            Some("created_desc") => SortOrder::CreatedDesc,
            _ => SortOrder::Natural,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            SortOrder::NameAsc => "name ASC, id ASC",
            SortOrder::NameDesc => "name DESC, id ASC",
            SortOrder::CreatedAsc => "created_at ASC, id ASC",
            SortOrder::CreatedDesc => "created_at DESC, id DESC",
            SortOrder::Natural => "id ASC",
        }
    }
}

/// Which of the two label tables a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Taxonomy {
    pub table: &'static str,
    pub join_table: &'static str,
    pub join_column: &'static str,
    /// Human name used in messages ("category", "tag").
    pub label: &'static str,
}

pub const CATEGORIES: Taxonomy = Taxonomy {
    table: "categories",
    join_table: "recipe_categories",
    join_column: "category_id",
    label: "category",
};

pub const TAGS: Taxonomy = Taxonomy {
    table: "tags",
    join_table: "recipe_tags",
    join_column: "tag_id",
    label: "tag",
};
