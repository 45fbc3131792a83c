//! Account service: registration, login, OTP verification, profile,
//! password changes, user search, and the per-user wall.
//!
//! DESIGN
//! ======
//! Emails are normalized (trimmed, lowercased) before every lookup and the
//! `users.email` column is UNIQUE, so the pre-insert existence check is only
//! a fast path; `ON CONFLICT DO NOTHING` settles registration races.
//!
//! ERROR HANDLING
//! ==============
//! Unknown email and wrong password both surface as `InvalidCredentials` so
//! login responses do not reveal which accounts exist.

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::otp::{self, Otp, OtpError, OtpNotifier};
use super::password::{self, PasswordError};
use crate::wall::{Wall, WallError};

pub const MAX_SEARCH_RESULTS: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    Invalid(String),
    #[error("User already exists")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Please verify your email first")]
    EmailNotVerified,
    #[error("Current password is incorrect")]
    WrongPassword,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Wall(#[from] WallError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Public identity returned by register/login/search.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Profile returned by `GET /user/:id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Full account row, credentials included. Never serialized.
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    is_verified: bool,
    otp: Option<Otp>,
}

impl AccountRow {
    fn from_row(row: &PgRow) -> Self {
        let otp_code: Option<String> = row.get("otp_code");
        let otp_expires_at: Option<OffsetDateTime> = row.get("otp_expires_at");
        Self {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_verified: row.get("is_verified"),
            otp: otp_code.zip(otp_expires_at).map(|(code, expires_at)| Otp { code, expires_at }),
        }
    }

    fn summary(self) -> UserSummary {
        UserSummary { id: self.id, name: self.name, email: self.email }
    }
}

const SELECT_ACCOUNT_BY_EMAIL: &str =
    "SELECT id, name, email, password_hash, is_verified, otp_code, otp_expires_at FROM users WHERE email = $1";
const SELECT_ACCOUNT_BY_ID: &str =
    "SELECT id, name, email, password_hash, is_verified, otp_code, otp_expires_at FROM users WHERE id = $1";

// =============================================================================
// INPUT NORMALIZATION
// =============================================================================

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return None;
    }
    if domain.starts_with('.') || domain.ends_with('.') || normalized.chars().any(char::is_whitespace) {
        return None;
    }
    Some(normalized)
}

pub fn validate_name(name: &str) -> Result<String, UserError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UserError::Invalid("Name is required".into()));
    }
    Ok(trimmed.to_owned())
}

/// Build an `ILIKE` pattern matching `query` anywhere, with wildcards escaped.
#[must_use]
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// REGISTRATION / LOGIN
// =============================================================================

pub struct Registration<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Create an account. When `require_verification` is set the account starts
/// unverified and a code is handed to `notifier`; if delivery fails the
/// account is removed again so the email can be retried.
///
/// # Errors
///
/// `Invalid` / `Password(TooShort)` for bad input, `EmailTaken` when the
/// email is registered, `Otp(Delivery)` when the notifier fails.
pub async fn register(
    pool: &PgPool,
    notifier: &dyn OtpNotifier,
    input: Registration<'_>,
    require_verification: bool,
) -> Result<UserSummary, UserError> {
    let name = validate_name(input.name)?;
    let email = normalize_email(input.email).ok_or_else(|| UserError::Invalid("Please enter a valid email".into()))?;
    password::validate_password(input.password)?;

    let taken: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if taken.is_some() {
        return Err(UserError::EmailTaken);
    }

    let password_hash = password::hash_password(input.password)?;
    let otp = require_verification.then(|| Otp::generate(OffsetDateTime::now_utc()));
    let id = Uuid::new_v4();

    let inserted = sqlx::query(
        r"INSERT INTO users (id, name, email, password_hash, is_verified, otp_code, otp_expires_at)
          VALUES ($1, $2, $3, $4, $5, $6, $7)
          ON CONFLICT (email) DO NOTHING",
    )
    .bind(id)
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .bind(!require_verification)
    .bind(otp.as_ref().map(|o| o.code.as_str()))
    .bind(otp.as_ref().map(|o| o.expires_at))
    .execute(pool)
    .await?;
    if inserted.rows_affected() == 0 {
        return Err(UserError::EmailTaken);
    }

    if let Some(otp) = otp {
        if let Err(e) = otp::deliver(notifier, &email, &name, &otp.code).await {
            tracing::error!(error = %e, user_id = %id, "verification code delivery failed");
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
            return Err(e.into());
        }
    }

    tracing::info!(user_id = %id, "user registered");
    Ok(UserSummary { id, name, email })
}

/// Check credentials and return the account.
///
/// # Errors
///
/// `InvalidCredentials` for unknown email or wrong password;
/// `EmailNotVerified` when verification is required and pending.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password_input: &str,
    require_verification: bool,
) -> Result<UserSummary, UserError> {
    let email = normalize_email(email).ok_or(UserError::InvalidCredentials)?;
    let row = sqlx::query(SELECT_ACCOUNT_BY_EMAIL)
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::InvalidCredentials)?;
    let account = AccountRow::from_row(&row);

    if !password::verify_password(password_input, &account.password_hash) {
        return Err(UserError::InvalidCredentials);
    }
    if require_verification && !account.is_verified {
        return Err(UserError::EmailNotVerified);
    }
    Ok(account.summary())
}

// =============================================================================
// OTP
// =============================================================================

async fn fetch_account(pool: &PgPool, user_id: Uuid) -> Result<AccountRow, UserError> {
    let row = sqlx::query(SELECT_ACCOUNT_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::NotFound(user_id))?;
    Ok(AccountRow::from_row(&row))
}

/// Verify the emailed code and mark the account verified.
///
/// # Errors
///
/// `NotFound` for an unknown user; `Otp(InvalidOrExpired)` when the code is
/// wrong, expired, or the account is already verified.
pub async fn verify_otp(pool: &PgPool, user_id: Uuid, code: &str) -> Result<UserSummary, UserError> {
    let account = fetch_account(pool, user_id).await?;
    otp::check_otp(account.otp.as_ref(), account.is_verified, code, OffsetDateTime::now_utc())?;

    let updated = sqlx::query(
        r"UPDATE users
          SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL
          WHERE id = $1 AND is_verified = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    // Lost a race with a concurrent verification of the same code.
    if updated.rows_affected() == 0 {
        return Err(OtpError::InvalidOrExpired.into());
    }

    tracing::info!(%user_id, "email verified");
    Ok(account.summary())
}

/// Issue a fresh code for an unverified account.
///
/// # Errors
///
/// `NotFound`, `AlreadyVerified`, or `Otp(Delivery)`.
pub async fn resend_otp(pool: &PgPool, notifier: &dyn OtpNotifier, user_id: Uuid) -> Result<(), UserError> {
    let account = fetch_account(pool, user_id).await?;
    if account.is_verified {
        return Err(UserError::AlreadyVerified);
    }

    let otp = Otp::generate(OffsetDateTime::now_utc());
    sqlx::query("UPDATE users SET otp_code = $2, otp_expires_at = $3 WHERE id = $1")
        .bind(user_id)
        .bind(&otp.code)
        .bind(otp.expires_at)
        .execute(pool)
        .await?;

    otp::deliver(notifier, &account.email, &account.name, &otp.code).await?;
    Ok(())
}

// =============================================================================
// PROFILE / PASSWORD / SEARCH
// =============================================================================

/// # Errors
///
/// `NotFound` for an unknown user.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<UserProfile, UserError> {
    let row = sqlx::query("SELECT id, name, email, is_verified, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::NotFound(user_id))?;

    Ok(UserProfile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        is_verified: row.get("is_verified"),
        created_at: row.get("created_at"),
    })
}

/// Replace the password after checking the current one.
///
/// # Errors
///
/// `Invalid` when a field is blank, `Password(TooShort)`, `NotFound`, or
/// `WrongPassword`.
pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), UserError> {
    if current_password.is_empty() || new_password.is_empty() {
        return Err(UserError::Invalid("Both current and new passwords are required".into()));
    }
    password::validate_password(new_password)?;

    let account = fetch_account(pool, user_id).await?;
    if !password::verify_password(current_password, &account.password_hash) {
        return Err(UserError::WrongPassword);
    }

    let password_hash = password::hash_password(new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;

    tracing::info!(%user_id, "password updated");
    Ok(())
}

/// Find verified users whose name or email contains `query`, excluding
/// `requester`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn search_users(pool: &PgPool, query: &str, requester: Uuid) -> Result<Vec<UserSummary>, UserError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, (Uuid, String, String)>(
        r"SELECT id, name, email
          FROM users
          WHERE is_verified AND id <> $2 AND (name ILIKE $1 OR email ILIKE $1)
          ORDER BY name ASC
          LIMIT $3",
    )
    .bind(contains_pattern(query))
    .bind(requester)
    .bind(MAX_SEARCH_RESULTS)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, email)| UserSummary { id, name, email })
        .collect())
}

// =============================================================================
// WALL
// =============================================================================

/// Load the user's wall, or an empty default wall if none was saved.
///
/// # Errors
///
/// `NotFound` for an unknown user.
pub async fn get_wall(pool: &PgPool, user_id: Uuid) -> Result<Wall, UserError> {
    let wall: Option<Option<Json<Wall>>> = sqlx::query_scalar("SELECT wall FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    let wall = wall.ok_or(UserError::NotFound(user_id))?;
    Ok(wall.map(|Json(w)| w).unwrap_or_default())
}

/// Store the wall after settling it against the saved one: a changed size
/// re-clamps every image into the new bounds.
///
/// # Errors
///
/// `NotFound` for an unknown user, `Wall` for out-of-range dimensions.
pub async fn save_wall(pool: &PgPool, user_id: Uuid, mut wall: Wall) -> Result<Wall, UserError> {
    let previous = get_wall(pool, user_id).await?;
    if wall.settle(&previous)? {
        tracing::debug!(%user_id, width = wall.width, height = wall.height, "wall resized");
    }
    let updated = sqlx::query("UPDATE users SET wall = $2 WHERE id = $1")
        .bind(user_id)
        .bind(Json(&wall))
        .execute(pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(UserError::NotFound(user_id));
    }
    Ok(wall)
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
