use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use crate::auth::jwt::validate_token;
use crate::auth::store;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
///
/// The user row is loaded on every request, so a deleted or deactivated
/// account stops working immediately even while its token is unexpired.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.0.id
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <token>".into())
            })?;

        let claims = validate_token(token.trim(), &state.config.auth).map_err(|e| {
            debug!("Rejected token: {e}");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        let user = store::find_by_id(&state.db, claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found or inactive".into()))?;

        Ok(CurrentUser(user))
    }
}
