//! One-time passcodes for email verification.
//!
//! Codes are six decimal digits, valid for ten minutes, and stored on the
//! user row until the account is verified. Delivery goes through the
//! [`OtpNotifier`] seam; the shipped [`LogNotifier`] only writes the code to
//! the log.

use async_trait::async_trait;
use rand::Rng;
use time::{Duration, OffsetDateTime};

pub const OTP_LEN: usize = 6;
pub const OTP_TTL: Duration = Duration::minutes(10);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid or expired OTP")]
    InvalidOrExpired,
    #[error("failed to send verification email: {0}")]
    Delivery(String),
}

/// A generated code and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

impl Otp {
    /// Generate a fresh code expiring [`OTP_TTL`] after `now`.
    #[must_use]
    pub fn generate(now: OffsetDateTime) -> Self {
        let code = rand::rng().random_range(100_000..1_000_000_u32).to_string();
        Self { code, expires_at: now + OTP_TTL }
    }
}

/// Normalize user input to a six-digit code, or `None` if it cannot be one.
#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.len() != OTP_LEN || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Accept `candidate` only if it equals the stored code, the code has not
/// expired, and the account is not verified yet.
pub fn check_otp(
    stored: Option<&Otp>,
    is_verified: bool,
    candidate: &str,
    now: OffsetDateTime,
) -> Result<(), OtpError> {
    let Some(stored) = stored else {
        return Err(OtpError::InvalidOrExpired);
    };
    let Some(candidate) = normalize_code(candidate) else {
        return Err(OtpError::InvalidOrExpired);
    };
    if stored.code == candidate && stored.expires_at > now && !is_verified {
        Ok(())
    } else {
        Err(OtpError::InvalidOrExpired)
    }
}

// =============================================================================
// DELIVERY
// =============================================================================

/// Failure reported by a notifier backend; wrapped as [`OtpError::Delivery`].
pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_code(&self, email: &str, name: &str, code: &str) -> Result<(), NotifyError>;
}

/// Hand `code` to `notifier`, folding backend failures into [`OtpError::Delivery`].
///
/// # Errors
///
/// `Delivery` with the backend's message.
pub async fn deliver(notifier: &dyn OtpNotifier, email: &str, name: &str, code: &str) -> Result<(), OtpError> {
    notifier
        .send_code(email, name, code)
        .await
        .map_err(|e| OtpError::Delivery(e.to_string()))
}

/// Writes codes to the log instead of mailing them.
pub struct LogNotifier;

#[async_trait]
impl OtpNotifier for LogNotifier {
    async fn send_code(&self, email: &str, name: &str, code: &str) -> Result<(), NotifyError> {
        tracing::info!(%email, %name, %code, "verification code issued");
        Ok(())
    }
}

#[cfg(test)]
#[path = "otp_test.rs"]
mod tests;
