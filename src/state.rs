use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    storage::BlobStore,
    utils::{clock::Clock, jwt::TokenCodec},
};

/// Everything a handler needs, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub blobs: Arc<dyn BlobStore>,
    pub tokens: TokenCodec,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        config: Config,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = TokenCodec::new(&config.jwt_secret, config.jwt_expiration);
        Self {
            pool,
            config,
            blobs,
            tokens,
            clock,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
