//! User profile, password, and search routes.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::user::{self, UserProfile, UserSummary};
use crate::services::wall_design::{self, WallDesign};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub wall_designs: Vec<WallDesign>,
}

/// `GET /user/:id`: the caller's own profile with saved wall designs.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    auth.ensure_is(user_id)?;
    let profile = user::get_profile(&state.pool, user_id).await?;
    let wall_designs = wall_design::list_designs(&state.pool, user_id).await?;
    Ok(Json(ProfileResponse { profile, wall_designs }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// `PUT /user/update-password/:id`
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdatePasswordBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.ensure_is(user_id)?;
    user::update_password(&state.pool, user_id, &body.current_password, &body.new_password).await?;
    Ok(Json(serde_json::json!({ "message": "Password updated successfully" })))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// `GET /users/search?query=`: verified users to share drafts with.
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = user::search_users(&state.pool, &params.query, auth.user_id).await?;
    Ok(Json(users))
}
