//! Draft routes: CRUD, sharing, and visibility.
//!
//! Identity always comes from the bearer token. Routes that name a user in
//! the path (`/drafts/:userId`, `/drafts/shared/:userId`) only serve that
//! user's own lists.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::draft::{self, DraftContent, DraftView};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftBody {
    pub name: Option<String>,
    pub wall_data: Option<serde_json::Value>,
    pub preview_image: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl DraftBody {
    fn into_content(self) -> Result<(DraftContent, bool), ApiError> {
        let content = DraftContent::new(self.name.as_deref(), self.wall_data, self.preview_image)?;
        Ok((content, self.is_public))
    }
}

/// `POST /drafts`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<DraftBody>,
) -> Result<(StatusCode, Json<DraftView>), ApiError> {
    let (content, is_public) = body.into_content()?;
    let created = draft::create_draft(&state.pool, auth.user_id, content, is_public).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `GET /drafts/:userId`: drafts owned by the caller.
pub async fn list_owned(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<DraftView>>, ApiError> {
    auth.ensure_is(user_id)?;
    let drafts = draft::list_owned(&state.pool, user_id).await?;
    Ok(Json(drafts.into_iter().map(DraftView::from).collect()))
}

/// `GET /drafts/shared/:userId`: drafts others shared with the caller.
pub async fn list_shared(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<DraftView>>, ApiError> {
    auth.ensure_is(user_id)?;
    let drafts = draft::list_shared_with(&state.pool, user_id).await?;
    Ok(Json(drafts.into_iter().map(DraftView::from).collect()))
}

/// `GET /drafts/single/:draftId`
pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<DraftView>, ApiError> {
    Ok(Json(draft::get_accessible(&state.pool, draft_id, auth.user_id).await?.into()))
}

/// `PUT /drafts/:draftId`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(draft_id): Path<Uuid>,
    Json(body): Json<DraftBody>,
) -> Result<Json<DraftView>, ApiError> {
    let (content, _) = body.into_content()?;
    Ok(Json(draft::update_draft(&state.pool, draft_id, auth.user_id, content).await?.into()))
}

/// `DELETE /drafts/:draftId`
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(draft_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    draft::delete_draft(&state.pool, draft_id, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Draft deleted successfully" })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareBody {
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
}

/// `POST /drafts/:draftId/share`
pub async fn share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(draft_id): Path<Uuid>,
    Json(body): Json<ShareBody>,
) -> Result<Json<DraftView>, ApiError> {
    Ok(Json(draft::share_draft(&state.pool, draft_id, auth.user_id, &body.user_ids).await?.into()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityBody {
    pub is_public: bool,
}

/// `PATCH /drafts/:draftId/public`
pub async fn set_public(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(draft_id): Path<Uuid>,
    Json(body): Json<VisibilityBody>,
) -> Result<Json<DraftView>, ApiError> {
    Ok(Json(draft::set_public(&state.pool, draft_id, auth.user_id, body.is_public).await?.into()))
}
