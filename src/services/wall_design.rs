//! Wall design service: named wall layouts saved by a user.
//!
//! A design is private to its creator. Updates are partial: fields absent
//! from the patch keep their stored value, and every successful update
//! bumps `lastModified`.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";

#[derive(Debug, thiserror::Error)]
pub enum WallDesignError {
    #[error("wall design not found: {0}")]
    NotFound(Uuid),
    #[error("Access denied to this wall design")]
    AccessDenied,
    #[error("{0}")]
    Invalid(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignImage {
    pub url: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallDesign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub wall_size: WallSize,
    pub background_color: String,
    pub images: Vec<DesignImage>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

/// Request body for creating a design.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWallDesign {
    pub name: Option<String>,
    pub wall_size: Option<WallSize>,
    pub background_color: Option<String>,
    #[serde(default)]
    pub images: Vec<DesignImage>,
}

/// Request body for a partial update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallDesignPatch {
    pub name: Option<String>,
    pub wall_size: Option<WallSize>,
    pub background_color: Option<String>,
    pub images: Option<Vec<DesignImage>>,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn validate_name(name: Option<&str>) -> Result<String, WallDesignError> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n.to_owned()),
        _ => Err(WallDesignError::Invalid("Design name is required".into())),
    }
}

fn validate_size(size: Option<WallSize>) -> Result<WallSize, WallDesignError> {
    match size {
        Some(s) if s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0 => Ok(s),
        Some(_) => Err(WallDesignError::Invalid("Wall size must be positive".into())),
        None => Err(WallDesignError::Invalid("Wall size is required".into())),
    }
}

fn validate_images(images: &[DesignImage]) -> Result<(), WallDesignError> {
    if images.iter().any(|img| img.url.trim().is_empty()) {
        return Err(WallDesignError::Invalid("Every image needs a url".into()));
    }
    Ok(())
}

fn background_or_default(color: Option<String>) -> String {
    color
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.to_owned())
}

impl NewWallDesign {
    fn validate(self) -> Result<(String, WallSize, String, Vec<DesignImage>), WallDesignError> {
        let name = validate_name(self.name.as_deref())?;
        let size = validate_size(self.wall_size)?;
        validate_images(&self.images)?;
        Ok((name, size, background_or_default(self.background_color), self.images))
    }
}

/// Apply `patch` to `design` in place. Nothing changes if validation fails.
///
/// # Errors
///
/// `Invalid` when a supplied field is blank or out of range.
pub fn apply_patch(design: &mut WallDesign, patch: WallDesignPatch) -> Result<(), WallDesignError> {
    let name = patch.name.as_deref().map(|n| validate_name(Some(n))).transpose()?;
    let size = patch.wall_size.map(|s| validate_size(Some(s))).transpose()?;
    if let Some(images) = &patch.images {
        validate_images(images)?;
    }

    if let Some(name) = name {
        design.name = name;
    }
    if let Some(size) = size {
        design.wall_size = size;
    }
    if let Some(color) = patch.background_color {
        design.background_color = background_or_default(Some(color));
    }
    if let Some(images) = patch.images {
        design.images = images;
    }
    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

const SELECT_DESIGN: &str = r"SELECT id, user_id, name, wall_width, wall_height, background_color, images,
       created_at, last_modified
  FROM wall_designs";

fn design_from_row(row: &PgRow) -> WallDesign {
    let Json(images): Json<Vec<DesignImage>> = row.get("images");
    WallDesign {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        wall_size: WallSize { width: row.get("wall_width"), height: row.get("wall_height") },
        background_color: row.get("background_color"),
        images,
        created_at: row.get("created_at"),
        last_modified: row.get("last_modified"),
    }
}

async fn load_owned(pool: &PgPool, design_id: Uuid, requester: Uuid) -> Result<WallDesign, WallDesignError> {
    let row = sqlx::query(&format!("{SELECT_DESIGN} WHERE id = $1"))
        .bind(design_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WallDesignError::NotFound(design_id))?;
    let design = design_from_row(&row);
    if design.user_id != requester {
        return Err(WallDesignError::AccessDenied);
    }
    Ok(design)
}

// =============================================================================
// CRUD
// =============================================================================

/// Create a design owned by `user_id`.
///
/// # Errors
///
/// `Invalid` for a missing name or size; database errors otherwise.
pub async fn create_design(pool: &PgPool, user_id: Uuid, input: NewWallDesign) -> Result<WallDesign, WallDesignError> {
    let (name, wall_size, background_color, images) = input.validate()?;
    let id = Uuid::new_v4();
    let (created_at, last_modified) = sqlx::query_as::<_, (OffsetDateTime, OffsetDateTime)>(
        r"INSERT INTO wall_designs (id, user_id, name, wall_width, wall_height, background_color, images)
          VALUES ($1, $2, $3, $4, $5, $6, $7)
          RETURNING created_at, last_modified",
    )
    .bind(id)
    .bind(user_id)
    .bind(&name)
    .bind(wall_size.width)
    .bind(wall_size.height)
    .bind(&background_color)
    .bind(Json(&images))
    .fetch_one(pool)
    .await?;

    tracing::info!(design_id = %id, %user_id, "wall design created");
    Ok(WallDesign { id, user_id, name, wall_size, background_color, images, created_at, last_modified })
}

/// Designs owned by `user_id`, most recently modified first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_designs(pool: &PgPool, user_id: Uuid) -> Result<Vec<WallDesign>, WallDesignError> {
    let rows = sqlx::query(&format!("{SELECT_DESIGN} WHERE user_id = $1 ORDER BY last_modified DESC"))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(design_from_row).collect())
}

/// # Errors
///
/// `NotFound` or `AccessDenied`.
pub async fn get_design(pool: &PgPool, design_id: Uuid, requester: Uuid) -> Result<WallDesign, WallDesignError> {
    load_owned(pool, design_id, requester).await
}

/// Apply a partial update. Owner only.
///
/// # Errors
///
/// `NotFound`, `AccessDenied`, or `Invalid`.
pub async fn update_design(
    pool: &PgPool,
    design_id: Uuid,
    requester: Uuid,
    patch: WallDesignPatch,
) -> Result<WallDesign, WallDesignError> {
    let mut design = load_owned(pool, design_id, requester).await?;
    apply_patch(&mut design, patch)?;

    design.last_modified = sqlx::query_scalar(
        r"UPDATE wall_designs
          SET name = $2, wall_width = $3, wall_height = $4, background_color = $5, images = $6,
              last_modified = now()
          WHERE id = $1
          RETURNING last_modified",
    )
    .bind(design_id)
    .bind(&design.name)
    .bind(design.wall_size.width)
    .bind(design.wall_size.height)
    .bind(&design.background_color)
    .bind(Json(&design.images))
    .fetch_optional(pool)
    .await?
    .ok_or(WallDesignError::NotFound(design_id))?;
    Ok(design)
}

/// # Errors
///
/// `NotFound` or `AccessDenied`.
pub async fn delete_design(pool: &PgPool, design_id: Uuid, requester: Uuid) -> Result<(), WallDesignError> {
    load_owned(pool, design_id, requester).await?;
    sqlx::query("DELETE FROM wall_designs WHERE id = $1")
        .bind(design_id)
        .execute(pool)
        .await?;
    tracing::info!(%design_id, "wall design deleted");
    Ok(())
}

#[cfg(test)]
#[path = "wall_design_test.rs"]
mod tests;
