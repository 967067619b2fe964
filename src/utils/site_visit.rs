// src/utils/site_visit.rs

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{state::AppState, utils::jwt::Claims};

/// Best guess at the caller's address: the socket peer, then the first
/// `X-Forwarded-For` entry, else `"unknown"`.
pub fn client_ip(req: &Request<Body>) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum Middleware: records one `site_visits` row per request.
///
/// Must sit inside `optional_auth_middleware` so the caller's id is known.
/// A failed insert is logged and the request carries on.
pub async fn record_visit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    let user_id = req.extensions().get::<Claims>().map(|claims| claims.sub);

    let inserted = sqlx::query("INSERT INTO site_visits (ip, user_id, visited_at) VALUES (?, ?, ?)")
        .bind(&ip)
        .bind(user_id)
        .bind(state.clock.now())
        .execute(&state.pool)
        .await;
    if let Err(e) = inserted {
        tracing::warn!("Failed to record site visit from {}: {:?}", ip, e);
    }

    next.run(req).await
}
