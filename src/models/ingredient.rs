use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'ingredients' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Free-form quantity, e.g. "2 cups".
    pub amount: String,
    pub recipe_id: i64,
}

/// An ingredient embedded in a recipe payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngredientInput {
    #[validate(length(
        min = 1,
        max = 200,
        message = "ingredient name must be between 1 and 200 characters"
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "ingredient amount must be at most 100 characters"))]
    pub amount: String,
}

/// Body of `POST /ingridient`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIngredientRequest {
    #[validate(length(min = 1, max = 200, message = "name must be between 1 and 200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100, message = "amount must be at most 100 characters"))]
    pub amount: String,
    #[validate(range(min = 1, message = "recipe_id must be a positive integer"))]
    pub recipe_id: i64,
}
