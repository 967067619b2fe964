// tests/common/mod.rs
#![allow(dead_code)]

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use chrono::Utc;
use recipe_api::{
    config::Config, db, routes, state::AppState, storage::LocalBlobStore,
    utils::clock::ManualClock,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub upload_dir: PathBuf,
    _dir: tempfile::TempDir,
}

/// Spawns the app on a random port, backed by a fresh SQLite file and
/// upload directory inside a temp dir.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let upload_dir = dir.path().join("uploads");

    let config = Config {
        database_url: format!("sqlite://{}", dir.path().join("test.db").display()),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 24 * 60 * 60,
        reset_token_ttl: 15 * 60,
        upload_dir: upload_dir.clone(),
        max_upload_bytes: MAX_UPLOAD_BYTES,
        db_max_connections: 5,
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        rust_log: "error".to_string(),
    };

    let pool = db::connect(&config)
        .await
        .expect("Failed to open test database");
    let blobs = LocalBlobStore::new(upload_dir.clone())
        .await
        .expect("Failed to create upload dir");
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let state = AppState::new(pool.clone(), config, Arc::new(blobs), clock.clone());
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        pool,
        clock,
        upload_dir,
        _dir: dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: &Value, token: &str) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/signup",
            &json!({ "name": "Test", "last_name": "User", "email": email, "password": password }),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/login", &json!({ "email": email, "password": password }), None)
            .await
    }

    /// Signs up a fresh user and logs in. Returns (user id, bearer token).
    pub async fn register_user(&self, email: &str) -> (i64, String) {
        assert_eq!(self.signup(email, "secret").await.status().as_u16(), 200);
        let body: Value = self.login(email, "secret").await.json().await.unwrap();
        let token = body["token"].as_str().expect("token missing").to_string();

        let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        (id, token)
    }

    /// Creates a recipe with two ingredients. Returns its id.
    pub async fn create_recipe(&self, token: &str, title: &str) -> i64 {
        let response = self
            .post_json(
                "/recipe",
                &json!({
                    "title": title,
                    "text": "Mix everything.",
                    "ingridient": [
                        { "name": "flour", "amount": "200g" },
                        { "name": "egg", "amount": "2" }
                    ]
                }),
                Some(token),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().expect("id missing")
    }
}

/// Smallest byte strings the sniffer accepts as each image type.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
pub const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 \x18\0\0\0";
pub const GIF: &[u8] = b"GIF89a\x01\0\x01\0\x80\0\0";

pub fn image_form(file_name: &str, data: &[u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name.to_string());
    reqwest::multipart::Form::new().part("image", part)
}
