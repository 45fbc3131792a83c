//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds every JSON endpoint plus the static `/uploads` directory under a
//! single Axum router. Auth is per-handler via the `AuthUser` extractor, so
//! public and protected routes share one table.

pub mod auth;
pub mod drafts;
pub mod error;
pub mod upload;
pub mod users;
pub mod wall;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Request bodies above this are refused before reaching a handler. Large
/// enough for a draft at its size caps plus JSON overhead.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/upload", post(upload::upload))
        .route("/user/{id}", get(users::get_user))
        .route("/user/update-password/{id}", put(users::update_password))
        .route("/users/search", get(users::search))
        .route("/wall", get(wall::get_wall).post(wall::save_wall))
        .route("/wall-designs", get(wall::list_designs).post(wall::create_design))
        .route(
            "/wall-designs/{id}",
            get(wall::get_design)
                .put(wall::update_design)
                .delete(wall::delete_design),
        )
        .route("/drafts", post(drafts::create))
        .route(
            "/drafts/{id}",
            get(drafts::list_owned)
                .put(drafts::update)
                .delete(drafts::delete),
        )
        .route("/drafts/single/{id}", get(drafts::get_one))
        .route("/drafts/shared/{id}", get(drafts::list_shared))
        .route("/drafts/{id}/share", post(drafts::share))
        .route("/drafts/{id}/public", patch(drafts::set_public))
        .route("/healthz", get(healthz))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
