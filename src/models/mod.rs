// src/models/mod.rs

pub mod analytics;
pub mod comment;
pub mod favorite;
pub mod image;
pub mod ingredient;
pub mod rating;
pub mod recipe;
pub mod site_visit;
pub mod taxonomy;
pub mod user;
