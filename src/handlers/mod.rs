// src/handlers/mod.rs

pub mod analytics;
pub mod auth;
pub mod image;
pub mod ingredient;
pub mod interaction;
pub mod profile;
pub mod recipe;
pub mod taxonomy;
