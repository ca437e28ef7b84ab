pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{analytics, assessment, auth, mentor, progress, roadmap};

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth & profile
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/login", post(auth::handlers::login))
        .route(
            "/users/me",
            get(auth::handlers::get_me)
                .patch(auth::handlers::update_me)
                .delete(auth::handlers::delete_me),
        )
        // Roadmaps
        .route("/roadmap/generate", post(roadmap::handlers::handle_generate))
        .route("/roadmap/me", get(roadmap::handlers::handle_active_roadmap))
        .route("/roadmaps", get(roadmap::handlers::handle_list_roadmaps))
        .route("/modules/:id", get(roadmap::handlers::handle_get_module))
        // Progress
        .route("/progress/update", post(progress::handlers::handle_update))
        .route("/progress/me", get(progress::handlers::handle_list))
        .route("/progress/reviews", get(progress::handlers::handle_due_reviews))
        .route("/badges", get(progress::handlers::handle_badges))
        // Mentor
        .route("/chat", post(mentor::handlers::handle_chat))
        .route("/chat/history", get(mentor::handlers::handle_history))
        // Assessments
        .route("/assessments", post(assessment::handlers::handle_create))
        .route("/assessments/:id", get(assessment::handlers::handle_get))
        .route(
            "/assessments/:id/submit",
            post(assessment::handlers::handle_submit),
        )
        // Analytics
        .route(
            "/analytics/me",
            get(analytics::handlers::handle_my_analytics),
        )
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", api_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests;
