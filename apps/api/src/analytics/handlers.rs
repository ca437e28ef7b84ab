use axum::{extract::State, Json};
use chrono::Utc;

use crate::analytics::summary::{load_analytics, UserAnalytics};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/analytics/me
pub async fn handle_my_analytics(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserAnalytics>, AppError> {
    let analytics = load_analytics(&state.db, user.id(), Utc::now().date_naive()).await?;
    Ok(Json(analytics))
}
