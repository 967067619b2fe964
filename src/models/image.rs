use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The kind of entity an image is attached to. The router layers one onto
/// each image route, so no other kind ever reaches the image core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Recipe,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Recipe => "recipe",
        }
    }

    /// Table holding the entities of this kind.
    pub(crate) fn table(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Recipe => "recipes",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'images' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Image {
    pub id: i64,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
    /// Path relative to the blob backend root: `<kind>/<entity-id>/<ts-ns><ext>`.
    pub path: String,
    /// Sniffed MIME type, served back as `Content-Type`.
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}
