// src/db.rs

use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::config::Config;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the connection pool and applies pending migrations.
///
/// Connections are never recycled on age or idleness; the pool only caps
/// how many are open at once.
pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory pool with the schema applied.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

/// Inserts a user row directly, bypassing signup. Returns its id.
#[cfg(test)]
pub async fn insert_test_user(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (name, last_name, email, password_hash, salt) \
         VALUES ('T', 'U', ?, 'x', 'y') RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Inserts a recipe row owned by `user_id`. Returns its id.
#[cfg(test)]
pub async fn insert_test_recipe(pool: &SqlitePool, user_id: i64, title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO recipes (title, body, user_id) VALUES (?, 'body', ?) RETURNING id",
    )
    .bind(title)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
