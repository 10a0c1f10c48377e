use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::handlers::{validate_optional, validate_required, AppJson};
use crate::middlewares::AuthUser;
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::repositories::{Repository, RevokedTokenRepository, UserRepository};
use crate::services::{AuthService, TokenKind};
use crate::state::AppState;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

fn validate_email(email: &str) -> AppResult<()> {
    validate_required(email, "Email", 254)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::Validation("Email is invalid".to_string())),
    }
}

// ============ Handlers ============

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = AuthResponse),
        (status = 409, description = "Username or email already exists"),
        (status = 400, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_required(&payload.username, "Username", 150)?;
    validate_email(&payload.email)?;
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    validate_optional(&payload.first_name, "First name", 150)?;
    validate_optional(&payload.last_name, "Last name", 150)?;

    let password_hash = AuthService::hash_password(&payload.password)?;

    let create_user = CreateUser {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };

    let user = UserRepository::create(&state.db, &create_user, &password_hash).await?;
    let tokens = AuthService::generate_token_pair(&user, &state.config)?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(Json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: user.into(),
    }))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepository::find_by_username(&state.db, &payload.username)
        .await
        .map_err(|_| AppError::InvalidCredentials)?;

    let is_valid = AuthService::verify_password(&payload.password, &user.password_hash)?;
    if !is_valid || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let tokens = AuthService::generate_token_pair(&user, &state.config)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: user.into(),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid, expired or revoked refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let claims = AuthService::verify_refresh_token(&payload.refresh_token, &state.config)?;
    if RevokedTokenRepository::is_revoked(&state.db, claims.jti).await? {
        return Err(AppError::InvalidToken);
    }

    // Re-read the user so role changes and deactivation take effect
    let user = UserRepository::find_by_id(&state.db, claims.sub)
        .await
        .map_err(|_| AppError::InvalidToken)?;
    if !user.is_active {
        return Err(AppError::InvalidToken);
    }

    let access_token = AuthService::generate_token(&user, TokenKind::Access, &state.config)?;
    Ok(Json(RefreshResponse { access_token }))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refresh token revoked"),
        (status = 401, description = "Unauthorized or invalid refresh token"),
        (status = 403, description = "Refresh token belongs to another user")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<()> {
    let claims = AuthService::verify_refresh_token(&payload.refresh_token, &state.config)?;
    if claims.sub != user.id {
        return Err(AppError::Forbidden(
            "Refresh token belongs to another user".to_string(),
        ));
    }

    RevokedTokenRepository::revoke(&state.db, &claims).await?;
    let purged = RevokedTokenRepository::purge_expired(&state.db).await?;

    tracing::info!(user_id = %user.id, purged, "Refresh token revoked");
    Ok(())
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user info", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let user_data = UserRepository::find_by_id(&state.db, user.id).await?;
    Ok(Json(user_data.into()))
}

/// Update current authenticated user
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already in use")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    validate_optional(&payload.first_name, "First name", 150)?;
    validate_optional(&payload.last_name, "Last name", 150)?;

    let update_user = UpdateUser {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
    };

    let updated_user = UserRepository::update(&state.db, user.id, &update_user).await?;
    Ok(Json(updated_user.into()))
}
