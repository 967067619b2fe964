// src/extractors/mod.rs
//
// Wrappers around axum's extractors whose rejections use the `{"error"}`
// envelope.

pub mod json;
pub mod multipart;
pub mod path;
pub mod query;

pub use json::AppJson;
pub use multipart::AppMultipart;
pub use path::AppPath;
pub use query::AppQuery;
