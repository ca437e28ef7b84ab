use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::roadmap::{ModuleRow, RoadmapRow};
use crate::roadmap::generator::{generate_roadmap, GenerateRoadmapRequest, GeneratedRoadmap};
use crate::roadmap::store;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RoadmapWithModules {
    pub roadmap: RoadmapRow,
    pub modules: Vec<ModuleRow>,
}

impl From<GeneratedRoadmap> for RoadmapWithModules {
    fn from(generated: GeneratedRoadmap) -> Self {
        Self {
            roadmap: generated.roadmap,
            modules: generated.modules,
        }
    }
}

/// POST /api/roadmap/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<GenerateRoadmapRequest>,
) -> Result<(StatusCode, Json<RoadmapWithModules>), AppError> {
    let generated = generate_roadmap(&state.db, state.generator.as_ref(), &user, &req).await?;
    Ok((StatusCode::CREATED, Json(generated.into())))
}

/// GET /api/roadmap/me
pub async fn handle_active_roadmap(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<RoadmapWithModules>, AppError> {
    let roadmap = store::active_roadmap(&state.db, user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("No active roadmap. Generate one first.".into()))?;
    let modules = store::modules_for(&state.db, roadmap.id).await?;
    Ok(Json(RoadmapWithModules { roadmap, modules }))
}

/// GET /api/roadmaps
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<RoadmapRow>>, AppError> {
    Ok(Json(store::list_roadmaps(&state.db, user.id()).await?))
}

/// GET /api/modules/:id
pub async fn handle_get_module(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleRow>, AppError> {
    store::find_user_module(&state.db, user.id(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Module {id} not found")))
}
