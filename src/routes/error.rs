//! JSON error responses and service-error status mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The body is always
//! `{"error": "<message>"}`; server-side failures are logged here and
//! reported with a generic message.

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use crate::rate_limit::RateLimitError;
use crate::services::draft::DraftError;
use crate::services::otp::OtpError;
use crate::services::password::PasswordError;
use crate::services::token::TokenError;
use crate::services::upload::UploadError;
use crate::services::user::UserError;
use crate::services::wall_design::WallDesignError;
use crate::wall::WallError;

const INTERNAL_MESSAGE: &str = "Server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), retry_after_secs: None }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Log `err` and hide it behind a generic 500.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(serde_json::json!({ "error": self.message }))).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

// =============================================================================
// SERVICE ERRORS
// =============================================================================

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Invalid(msg) => Self::bad_request(msg),
            UserError::EmailTaken | UserError::AlreadyVerified => Self::bad_request(err.to_string()),
            UserError::InvalidCredentials | UserError::EmailNotVerified | UserError::WrongPassword => {
                Self::unauthorized(err.to_string())
            }
            UserError::NotFound(_) => Self::not_found("User not found"),
            UserError::Otp(e) => e.into(),
            UserError::Password(e) => e.into(),
            UserError::Wall(e) => e.into(),
            UserError::Database(e) => Self::internal(e),
        }
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::InvalidOrExpired => Self::bad_request(err.to_string()),
            OtpError::Delivery(_) => Self::internal(err),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort => Self::bad_request(err.to_string()),
            PasswordError::Hash(_) => Self::internal(err),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid => Self::unauthorized("Token is not valid"),
            TokenError::Signing(_) => Self::internal(err),
        }
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::NotFound(_) => Self::not_found("Draft not found"),
            DraftError::AccessDenied => Self::forbidden(err.to_string()),
            DraftError::Invalid(msg) => Self::bad_request(msg),
            DraftError::UnknownUsers(_) => Self::not_found("Some users not found"),
            DraftError::Database(e) => Self::internal(e),
        }
    }
}

impl From<WallDesignError> for ApiError {
    fn from(err: WallDesignError) -> Self {
        match err {
            WallDesignError::NotFound(_) => Self::not_found("Wall design not found"),
            WallDesignError::AccessDenied => Self::forbidden(err.to_string()),
            WallDesignError::Invalid(msg) => Self::bad_request(msg),
            WallDesignError::Database(e) => Self::internal(e),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Empty | UploadError::UnsupportedMediaType => Self::bad_request(err.to_string()),
            UploadError::TooLarge => Self::new(StatusCode::PAYLOAD_TOO_LARGE, err.to_string()),
            UploadError::Io(e) => Self::internal(e),
        }
    }
}

impl From<WallError> for ApiError {
    fn from(err: WallError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: err.to_string(),
            retry_after_secs: Some(err.retry_after_secs),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
