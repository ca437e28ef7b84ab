use axum::{extract::State, http::StatusCode, Json};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::jwt::issue_access_token;
use crate::auth::password::{check_password_length, hash_password, verify_password};
use crate::auth::store::{self, NewUser, UserUpdate};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::{LearningIntensity, UserProfile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub background: Option<String>,
    pub current_role: Option<String>,
    pub target_role: Option<String>,
    pub years_experience: Option<i32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub learning_intensity: LearningIntensity,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn check_years(years: Option<i32>) -> Result<(), AppError> {
    match years {
        Some(y) if y < 0 => Err(AppError::Validation(
            "years_experience cannot be negative".into(),
        )),
        _ => Ok(()),
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".into()));
    }
    let email = normalize_email(&req.email);
    if !EmailAddress::is_valid(&email) {
        return Err(AppError::Validation(format!("'{email}' is not a valid email address")));
    }
    check_password_length(&req.password).map_err(AppError::Validation)?;
    check_years(req.years_experience)?;

    if store::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    let user = store::insert_user(
        &state.db,
        NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            background: req.background.as_deref(),
            current_role: req.current_role.as_deref(),
            target_role: req.target_role.as_deref(),
            years_experience: req.years_experience.unwrap_or(0),
            skills: &req.skills,
            learning_intensity: req.learning_intensity,
        },
    )
    .await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Incorrect email or password".into());

    let user = store::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    let password_ok = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password verification failed: {e}")))?;
    if !password_ok {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }
    if !user.is_active {
        warn!("Login refused for inactive user {}", user.id);
        return Err(invalid());
    }

    let auth = &state.config.auth;
    let access_token = issue_access_token(user.id, auth)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: auth.access_token_expiry_mins * 60,
    }))
}

/// GET /api/users/me
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.into())
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("name cannot be empty".into()));
    }
    check_years(update.years_experience)?;

    let row = store::update_profile(&state.db, user.id(), &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(row.into()))
}

/// DELETE /api/users/me
pub async fn delete_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    if !store::delete_user(&state.db, user.id()).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
