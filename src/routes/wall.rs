//! Wall state and saved wall design routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::user;
use crate::services::wall_design::{self, NewWallDesign, WallDesign, WallDesignPatch};
use crate::state::AppState;
use crate::wall::{Wall, WallWire};

/// `GET /wall`: the caller's current wall.
pub async fn get_wall(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Wall>, ApiError> {
    Ok(Json(user::get_wall(&state.pool, auth.user_id).await?))
}

/// `POST /wall`: replace the caller's wall; images are clamped into bounds.
pub async fn save_wall(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(wire): Json<WallWire>,
) -> Result<Json<Wall>, ApiError> {
    // Decode here rather than via `Json<Wall>` so misaligned arrays are a 400.
    let wall = Wall::try_from(wire)?;
    Ok(Json(user::save_wall(&state.pool, auth.user_id, wall).await?))
}

/// `GET /wall-designs`
pub async fn list_designs(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<WallDesign>>, ApiError> {
    Ok(Json(wall_design::list_designs(&state.pool, auth.user_id).await?))
}

/// `POST /wall-designs`
pub async fn create_design(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewWallDesign>,
) -> Result<(StatusCode, Json<WallDesign>), ApiError> {
    let design = wall_design::create_design(&state.pool, auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(design)))
}

/// `GET /wall-designs/:id`
pub async fn get_design(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(design_id): Path<Uuid>,
) -> Result<Json<WallDesign>, ApiError> {
    Ok(Json(wall_design::get_design(&state.pool, design_id, auth.user_id).await?))
}

/// `PUT /wall-designs/:id`
pub async fn update_design(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(design_id): Path<Uuid>,
    Json(patch): Json<WallDesignPatch>,
) -> Result<Json<WallDesign>, ApiError> {
    Ok(Json(wall_design::update_design(&state.pool, design_id, auth.user_id, patch).await?))
}

/// `DELETE /wall-designs/:id`
pub async fn delete_design(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(design_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    wall_design::delete_design(&state.pool, design_id, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Design deleted successfully" })))
}
