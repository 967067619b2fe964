//! Blob backend for entity images.
//!
//! Blobs are addressed by a relative path such as `recipe/1/1700000000000000000.jpg`.
//! The local backend maps that path under a configured base directory.

mod error;
mod local;
mod traits;

pub use error::StorageError;
pub use local::LocalBlobStore;
pub use traits::{BlobStore, BoxReader};
