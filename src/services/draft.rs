//! Draft service: saved wall snapshots with sharing and visibility.
//!
//! DESIGN
//! ======
//! A draft is readable by its owner, by every user on its share list, and
//! by anyone once it is public. Only the owner may change, share, publish,
//! or delete it. The share list lives in `draft_shares` keyed by
//! `(draft_id, user_id)`, so re-sharing with an existing user is a no-op at
//! the database level as well as in [`merge_shares`].
//!
//! ERROR HANDLING
//! ==============
//! Size limits are checked before any write; a rejected draft never
//! reaches Postgres.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_WALL_DATA_BYTES: usize = 15 * 1024 * 1024;
pub const MAX_PREVIEW_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("draft not found: {0}")]
    NotFound(Uuid),
    #[error("Access denied to this draft")]
    AccessDenied,
    #[error("{0}")]
    Invalid(String),
    #[error("unknown users: {0:?}")]
    UnknownUsers(Vec<Uuid>),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Private,
    SharedWithList,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntry {
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub shared_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub shared_with: Vec<ShareEntry>,
    pub wall_data: serde_json::Value,
    pub preview_image: String,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Draft {
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        if self.is_public {
            Visibility::Public
        } else if self.shared_with.is_empty() {
            Visibility::Private
        } else {
            Visibility::SharedWithList
        }
    }

    #[must_use]
    pub fn is_shared_with(&self, user_id: Uuid) -> bool {
        self.shared_with.iter().any(|s| s.user_id == user_id)
    }

    /// Owner, share-list member, or anyone when public.
    #[must_use]
    pub fn can_view(&self, requester: Uuid) -> bool {
        self.owner_id == requester || self.is_public || self.is_shared_with(requester)
    }

    pub fn ensure_viewer(&self, requester: Uuid) -> Result<(), DraftError> {
        if self.can_view(requester) { Ok(()) } else { Err(DraftError::AccessDenied) }
    }

    pub fn ensure_owner(&self, requester: Uuid) -> Result<(), DraftError> {
        if self.owner_id == requester { Ok(()) } else { Err(DraftError::AccessDenied) }
    }
}

/// Draft as returned over HTTP, with its derived visibility alongside.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: Draft,
    pub visibility: Visibility,
}

impl From<Draft> for DraftView {
    fn from(draft: Draft) -> Self {
        let visibility = draft.visibility();
        Self { draft, visibility }
    }
}

/// Validated, size-checked draft body.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftContent {
    pub name: String,
    pub wall_data: serde_json::Value,
    pub preview_image: String,
}

impl DraftContent {
    /// Trim and bound the name, enforce the size caps, and drop null
    /// entries from the wall's image arrays.
    ///
    /// # Errors
    ///
    /// `Invalid` naming the offending field.
    pub fn new(
        name: Option<&str>,
        wall_data: Option<serde_json::Value>,
        preview_image: Option<String>,
    ) -> Result<Self, DraftError> {
        let name = name.map(str::trim).unwrap_or_default();
        let wall_data = wall_data.filter(|v| !v.is_null());
        let preview_image = preview_image.filter(|p| !p.is_empty());

        let missing: Vec<&str> = [
            (name.is_empty(), "name"),
            (wall_data.is_none(), "wallData"),
            (preview_image.is_none(), "previewImage"),
        ]
        .into_iter()
        .filter_map(|(is_missing, field)| is_missing.then_some(field))
        .collect();
        let (true, Some(mut wall_data), Some(preview_image)) = (missing.is_empty(), wall_data, preview_image) else {
            return Err(DraftError::Invalid(format!("Missing required fields: {}", missing.join(", "))));
        };

        if name.chars().count() > MAX_NAME_CHARS {
            return Err(DraftError::Invalid(format!("Draft name cannot exceed {MAX_NAME_CHARS} characters")));
        }
        if preview_image.len() > MAX_PREVIEW_BYTES {
            return Err(DraftError::Invalid("Preview image exceeds maximum allowed size of 2MB".into()));
        }
        drop_null_images(&mut wall_data);
        let wall_bytes = serde_json::to_vec(&wall_data).map_or(usize::MAX, |v| v.len());
        if wall_bytes > MAX_WALL_DATA_BYTES {
            return Err(DraftError::Invalid("Wall data exceeds maximum allowed size of 15MB".into()));
        }

        Ok(Self { name: name.to_owned(), wall_data, preview_image })
    }
}

/// Remove null slots from `images` / `imageStates`, dropping a pair together
/// when either half is null so the arrays stay index-aligned.
fn drop_null_images(wall_data: &mut serde_json::Value) {
    let Some(obj) = wall_data.as_object_mut() else {
        return;
    };
    let images = obj.get("images").and_then(|v| v.as_array()).cloned();
    let states = obj.get("imageStates").and_then(|v| v.as_array()).cloned();

    match (images, states) {
        (Some(images), Some(states)) => {
            let paired = images.len().min(states.len());
            let mut kept_images = Vec::with_capacity(images.len());
            let mut kept_states = Vec::with_capacity(states.len());
            for (img, state) in images.iter().zip(&states) {
                if !img.is_null() && !state.is_null() {
                    kept_images.push(img.clone());
                    kept_states.push(state.clone());
                }
            }
            kept_images.extend(images.into_iter().skip(paired).filter(|v| !v.is_null()));
            kept_states.extend(states.into_iter().skip(paired).filter(|v| !v.is_null()));
            obj.insert("images".into(), kept_images.into());
            obj.insert("imageStates".into(), kept_states.into());
        }
        (Some(images), None) => {
            let kept: Vec<_> = images.into_iter().filter(|v| !v.is_null()).collect();
            obj.insert("images".into(), kept.into());
        }
        (None, Some(states)) => {
            let kept: Vec<_> = states.into_iter().filter(|v| !v.is_null()).collect();
            obj.insert("imageStates".into(), kept.into());
        }
        (None, None) => {}
    }
}

/// Append each id in `user_ids` not already shared (and not the owner),
/// stamped with `now`. Returns the ids that were added, in input order.
pub fn merge_shares(shared_with: &mut Vec<ShareEntry>, owner_id: Uuid, user_ids: &[Uuid], now: OffsetDateTime) -> Vec<Uuid> {
    let mut added = Vec::new();
    for &user_id in user_ids {
        if user_id == owner_id || shared_with.iter().any(|s| s.user_id == user_id) {
            continue;
        }
        shared_with.push(ShareEntry { user_id, shared_at: now });
        added.push(user_id);
    }
    added
}

// =============================================================================
// QUERIES
// =============================================================================

const DRAFT_COLUMNS: &str = "d.id, d.name, d.owner_id, d.wall_data, d.preview_image, d.is_public, d.created_at, d.updated_at";

fn draft_from_row(row: &PgRow) -> Draft {
    let Json(wall_data): Json<serde_json::Value> = row.get("wall_data");
    Draft {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        shared_with: Vec::new(),
        wall_data,
        preview_image: row.get("preview_image"),
        is_public: row.get("is_public"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Fill `shared_with` for every draft in one query.
async fn attach_shares(pool: &PgPool, drafts: &mut [Draft]) -> Result<(), sqlx::Error> {
    if drafts.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = drafts.iter().map(|d| d.id).collect();
    let rows = sqlx::query_as::<_, (Uuid, Uuid, OffsetDateTime)>(
        "SELECT draft_id, user_id, shared_at FROM draft_shares WHERE draft_id = ANY($1) ORDER BY shared_at ASC, user_id ASC",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_draft: HashMap<Uuid, Vec<ShareEntry>> = HashMap::new();
    for (draft_id, user_id, shared_at) in rows {
        by_draft
            .entry(draft_id)
            .or_default()
            .push(ShareEntry { user_id, shared_at });
    }
    for draft in drafts {
        draft.shared_with = by_draft.remove(&draft.id).unwrap_or_default();
    }
    Ok(())
}

async fn load(pool: &PgPool, draft_id: Uuid) -> Result<Draft, DraftError> {
    let row = sqlx::query(&format!("SELECT {DRAFT_COLUMNS} FROM drafts d WHERE d.id = $1"))
        .bind(draft_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DraftError::NotFound(draft_id))?;
    let mut drafts = [draft_from_row(&row)];
    attach_shares(pool, &mut drafts).await?;
    let [draft] = drafts;
    Ok(draft)
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Create a draft owned by `owner_id`.
///
/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn create_draft(
    pool: &PgPool,
    owner_id: Uuid,
    content: DraftContent,
    is_public: bool,
) -> Result<Draft, DraftError> {
    let id = Uuid::new_v4();
    let (created_at, updated_at) = sqlx::query_as::<_, (OffsetDateTime, OffsetDateTime)>(
        r"INSERT INTO drafts (id, name, owner_id, wall_data, preview_image, is_public)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING created_at, updated_at",
    )
    .bind(id)
    .bind(&content.name)
    .bind(owner_id)
    .bind(Json(&content.wall_data))
    .bind(&content.preview_image)
    .bind(is_public)
    .fetch_one(pool)
    .await?;

    tracing::info!(draft_id = %id, %owner_id, "draft created");
    Ok(Draft {
        id,
        name: content.name,
        owner_id,
        shared_with: Vec::new(),
        wall_data: content.wall_data,
        preview_image: content.preview_image,
        is_public,
        created_at,
        updated_at,
    })
}

/// Drafts owned by `owner_id`, most recently updated first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_owned(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Draft>, DraftError> {
    let rows = sqlx::query(&format!(
        "SELECT {DRAFT_COLUMNS} FROM drafts d WHERE d.owner_id = $1 ORDER BY d.updated_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    let mut drafts: Vec<Draft> = rows.iter().map(draft_from_row).collect();
    attach_shares(pool, &mut drafts).await?;
    Ok(drafts)
}

/// Drafts shared with `user_id`, most recently shared first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_shared_with(pool: &PgPool, user_id: Uuid) -> Result<Vec<Draft>, DraftError> {
    let rows = sqlx::query(&format!(
        r"SELECT {DRAFT_COLUMNS}
          FROM drafts d
          JOIN draft_shares s ON s.draft_id = d.id
          WHERE s.user_id = $1
          ORDER BY s.shared_at DESC, d.id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    let mut drafts: Vec<Draft> = rows.iter().map(draft_from_row).collect();
    attach_shares(pool, &mut drafts).await?;
    Ok(drafts)
}

/// Fetch a draft if `requester` may view it.
///
/// # Errors
///
/// `NotFound` or `AccessDenied`.
pub async fn get_accessible(pool: &PgPool, draft_id: Uuid, requester: Uuid) -> Result<Draft, DraftError> {
    let draft = load(pool, draft_id).await?;
    draft.ensure_viewer(requester)?;
    Ok(draft)
}

/// Replace a draft's content. Owner only.
///
/// # Errors
///
/// `NotFound` or `AccessDenied`.
pub async fn update_draft(
    pool: &PgPool,
    draft_id: Uuid,
    requester: Uuid,
    content: DraftContent,
) -> Result<Draft, DraftError> {
    let mut draft = load(pool, draft_id).await?;
    draft.ensure_owner(requester)?;

    let updated_at: OffsetDateTime = sqlx::query_scalar(
        r"UPDATE drafts
          SET name = $2, wall_data = $3, preview_image = $4, updated_at = now()
          WHERE id = $1
          RETURNING updated_at",
    )
    .bind(draft_id)
    .bind(&content.name)
    .bind(Json(&content.wall_data))
    .bind(&content.preview_image)
    .fetch_optional(pool)
    .await?
    .ok_or(DraftError::NotFound(draft_id))?;

    draft.name = content.name;
    draft.wall_data = content.wall_data;
    draft.preview_image = content.preview_image;
    draft.updated_at = updated_at;
    Ok(draft)
}

/// Delete a draft. Owner only.
///
/// # Errors
///
/// `NotFound` or `AccessDenied`.
pub async fn delete_draft(pool: &PgPool, draft_id: Uuid, requester: Uuid) -> Result<(), DraftError> {
    let draft = load(pool, draft_id).await?;
    draft.ensure_owner(requester)?;

    sqlx::query("DELETE FROM drafts WHERE id = $1")
        .bind(draft_id)
        .execute(pool)
        .await?;
    tracing::info!(%draft_id, "draft deleted");
    Ok(())
}

/// Share a draft with additional users. Owner only; idempotent.
///
/// # Errors
///
/// `Invalid` for an empty list, `UnknownUsers` when an id is not a
/// registered user, `NotFound`, or `AccessDenied`.
pub async fn share_draft(
    pool: &PgPool,
    draft_id: Uuid,
    requester: Uuid,
    user_ids: &[Uuid],
) -> Result<Draft, DraftError> {
    if user_ids.is_empty() {
        return Err(DraftError::Invalid("No users selected".into()));
    }
    let mut draft = load(pool, draft_id).await?;
    draft.ensure_owner(requester)?;

    let known: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .fetch_all(pool)
        .await?;
    let unknown: Vec<Uuid> = user_ids.iter().copied().filter(|id| !known.contains(id)).collect();
    if !unknown.is_empty() {
        return Err(DraftError::UnknownUsers(unknown));
    }

    let now = OffsetDateTime::now_utc();
    let added = merge_shares(&mut draft.shared_with, draft.owner_id, user_ids, now);
    if !added.is_empty() {
        sqlx::query(
            r"INSERT INTO draft_shares (draft_id, user_id, shared_at)
              SELECT $1, user_id, $3 FROM UNNEST($2::uuid[]) AS t(user_id)
              ON CONFLICT (draft_id, user_id) DO NOTHING",
        )
        .bind(draft_id)
        .bind(&added)
        .bind(now)
        .execute(pool)
        .await?;
        tracing::info!(%draft_id, added = added.len(), "draft shared");
    }

    // Re-read so concurrent shares are reflected with their stored timestamps.
    load(pool, draft_id).await
}

/// Toggle public visibility. Owner only.
///
/// # Errors
///
/// `NotFound` or `AccessDenied`.
pub async fn set_public(pool: &PgPool, draft_id: Uuid, requester: Uuid, is_public: bool) -> Result<Draft, DraftError> {
    let mut draft = load(pool, draft_id).await?;
    draft.ensure_owner(requester)?;

    let updated_at: OffsetDateTime =
        sqlx::query_scalar("UPDATE drafts SET is_public = $2, updated_at = now() WHERE id = $1 RETURNING updated_at")
            .bind(draft_id)
            .bind(is_public)
            .fetch_optional(pool)
            .await?
            .ok_or(DraftError::NotFound(draft_id))?;

    draft.is_public = is_public;
    draft.updated_at = updated_at;
    Ok(draft)
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
