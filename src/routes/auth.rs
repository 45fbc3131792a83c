//! Auth routes: registration, login, OTP verification, bearer extraction.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::error::ApiError;
use crate::services::token::bearer_token;
use crate::services::user::{self, Registration, UserSummary};
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated caller, taken from `Authorization: Bearer <jwt>`.
/// Use as a handler parameter to require authentication.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    /// Refuse unless the caller is `user_id`.
    pub fn ensure_is(self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user_id == user_id { Ok(()) } else { Err(ApiError::forbidden("Access denied")) }
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))?;

        let app_state = AppState::from_ref(state);
        let user_id = app_state.tokens.verify(token)?;
        Ok(Self { user_id })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of a successful `POST /register`.
///
/// While verification is pending the account gets no token; the client
/// continues at `/verify-otp`, which signs it in.
#[derive(Serialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    #[serde(rename_all = "camelCase")]
    Pending { message: &'static str, user_id: Uuid },
    SignedIn(AuthResponse),
}

impl RegisterResponse {
    fn for_user(state: &AppState, user: UserSummary) -> Result<Self, ApiError> {
        if state.config.require_email_verification {
            return Ok(Self::Pending { message: "Registration initiated. Please verify your email.", user_id: user.id });
        }
        let token = state.tokens.issue(user.id)?;
        Ok(Self::SignedIn(AuthResponse { token, user }))
    }
}

/// `POST /register`: create an account and send its verification code.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let input = Registration { name: &body.name, email: &body.email, password: &body.password };
    let user = user::register(&state.pool, state.notifier.as_ref(), input, state.config.require_email_verification).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse::for_user(&state, user)?)))
}

#[derive(Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /login`: exchange credentials for a token.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<Json<AuthResponse>, ApiError> {
    let key = format!("login:{}", body.email.trim().to_ascii_lowercase());
    state.limiter.check_and_record(&key)?;

    let user = user::login(&state.pool, &body.email, &body.password, state.config.require_email_verification).await?;
    state.limiter.reset(&key);
    tracing::info!(user_id = %user.id, "login");

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse { token, user }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpBody {
    pub user_id: Uuid,
    #[serde(default)]
    pub otp: String,
}

/// `POST /verify-otp`: mark the account verified and return a fresh token.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<AuthResponse>, ApiError> {
    let key = format!("otp:{}", body.user_id);
    state.limiter.check_and_record(&key)?;

    let user = user::verify_otp(&state.pool, body.user_id, &body.otp).await?;
    state.limiter.reset(&key);

    let token = state.tokens.issue(user.id)?;
    Ok(Json(AuthResponse { token, user }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpBody {
    pub user_id: Uuid,
}

/// `POST /resend-otp`: issue and send a new code.
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.limiter.check_and_record(&format!("resend:{}", body.user_id))?;
    user::resend_otp(&state.pool, state.notifier.as_ref(), body.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "New OTP sent successfully" })))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
