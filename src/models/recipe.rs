use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{
    image::Image,
    ingredient::{Ingredient, IngredientInput},
    taxonomy::TaxonomyItem,
};

/// Represents the 'recipes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    /// Preparation text. Called `text` on the wire.
    #[serde(rename = "text")]
    pub body: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recipe together with everything hanging off it.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub categories: Vec<TaxonomyItem>,
    pub tags: Vec<TaxonomyItem>,
    pub images: Vec<Image>,
}

/// Body of `POST /recipe` and `PUT /recipe/{id}`.
///
/// On update the supplied ingredient list replaces the stored one entirely.
#[derive(Debug, Deserialize, Validate)]
pub struct RecipePayload {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 20000,
        message = "text must be between 1 and 20000 characters"
    ))]
    pub text: String,

    #[serde(default)]
    #[validate(nested)]
    pub ingridient: Vec<IngredientInput>,
}
