// src/services/mod.rs

pub mod images;
pub mod pagination;
pub mod ranking;
pub mod recipes;
