//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It bundles the database pool with the services built from config at
//! startup. Clone is required by Axum; every field is a pool, an `Arc`, or
//! a cheap handle around one.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::rate_limit::AttemptLimiter;
use crate::services::otp::OtpNotifier;
use crate::services::token::TokenService;
use crate::services::upload::{BlobStore, UploadService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub uploads: UploadService,
    /// Receives freshly generated OTP codes.
    pub notifier: Arc<dyn OtpNotifier>,
    /// Throttles login and OTP attempts.
    pub limiter: AttemptLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: AppConfig, store: Arc<dyn BlobStore>, notifier: Arc<dyn OtpNotifier>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl_secs);
        let uploads = UploadService::new(store, config.public_base_url.clone());
        Self { pool, config: Arc::new(config), tokens, uploads, notifier, limiter: AttemptLimiter::from_env() }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
