// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    extractors::AppJson,
    models::user::{
        ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest, User,
    },
    state::AppState,
    utils::{
        hash::{generate_salt, hash_password, verify_password},
        reset_token::generate_reset_token,
    },
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "if an account with that email exists, a password reset token has been issued";

fn invalid_credentials() -> AppError {
    AppError::AuthError("invalid email or password".to_string())
}

fn invalid_reset_token() -> AppError {
    AppError::BadRequest("invalid or expired token".to_string())
}

/// Registers a new user.
///
/// Hashes the password with a fresh salt before storing it.
/// Returns 409 when the email is already taken.
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let conflict = || AppError::Conflict("user with this email already exists".to_string());

    let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(&payload.email)
        .fetch_one(&state.pool)
        .await?;
    if taken {
        return Err(conflict());
    }

    let salt = generate_salt();
    let password_hash = hash_password(&payload.password, &salt)?;
    let now = state.clock.now();

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (name, last_name, email, password_hash, salt, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&salt)
    .bind(now)
    .bind(now)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            conflict()
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id, "user signed up");
    Ok(Json(json!({ "message": "user created successfully" })))
}

/// Authenticates a user and returns a bearer token.
///
/// Unknown email and wrong password get the same answer.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &user.salt, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "login rejected");
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id, &user.email, state.clock.now())?;
    Ok(Json(json!({ "token": token })))
}

/// Issues a single-use reset token for the account, if there is one.
///
/// Always answers 200 with the same message. The token is returned inline
/// since there is no mail delivery.
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;

    let Some(user_id) = user_id else {
        return Ok(Json(json!({ "message": FORGOT_PASSWORD_MESSAGE })));
    };

    let now = state.clock.now();
    let ttl = i64::try_from(state.config.reset_token_ttl).unwrap_or(i64::MAX);
    let expires_at = now + Duration::seconds(ttl);
    let token = generate_reset_token();

    sqlx::query(
        r#"
        UPDATE users
        SET password_reset_token = ?, password_reset_expires_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&token)
    .bind(expires_at)
    .bind(now)
    .bind(user_id)
    .execute(&state.pool)
    .await?;

    tracing::info!(user_id, "password reset token issued");
    Ok(Json(json!({
        "message": FORGOT_PASSWORD_MESSAGE,
        "reset_token": token,
    })))
}

/// Sets a new password given a live reset token, then burns the token.
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Unset tokens are stored as "", so an empty token must never reach the lookup.
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(invalid_reset_token());
    }

    let now = state.clock.now();

    let pending: Option<(i64, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT id, password_reset_expires_at FROM users WHERE password_reset_token = ?",
    )
    .bind(token)
    .fetch_optional(&state.pool)
    .await?;

    let user_id = match pending {
        Some((id, Some(expires_at))) if expires_at > now => id,
        _ => return Err(invalid_reset_token()),
    };

    let salt = generate_salt();
    let password_hash = hash_password(&payload.new_password, &salt)?;

    let updated = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = ?, salt = ?, password_reset_token = '',
            password_reset_expires_at = NULL, updated_at = ?
        WHERE id = ? AND password_reset_token = ?
        "#,
    )
    .bind(&password_hash)
    .bind(&salt)
    .bind(now)
    .bind(user_id)
    .bind(token)
    .execute(&state.pool)
    .await?
    .rows_affected();

    // Lost a race with another reset using the same token.
    if updated == 0 {
        return Err(invalid_reset_token());
    }

    tracing::info!(user_id, "password reset");
    Ok(Json(json!({ "message": "password has been reset" })))
}
