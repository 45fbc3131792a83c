use super::*;
use axum::http::Request;
use axum::extract::FromRequestParts;

use crate::state::test_helpers::test_app_state;

async fn extract(state: &AppState, authorization: Option<&str>) -> Result<AuthUser, ApiError> {
    let mut builder = Request::get("/wall");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    let (mut parts, ()) = builder.body(()).unwrap().into_parts();
    AuthUser::from_request_parts(&mut parts, state).await
}

#[tokio::test]
async fn extractor_accepts_valid_bearer() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    let user_id = Uuid::new_v4();
    let token = state.tokens.issue(user_id).unwrap();

    let auth = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap();
    assert_eq!(auth.user_id, user_id);

    let auth = extract(&state, Some(&format!("bearer   {token}"))).await.unwrap();
    assert_eq!(auth.user_id, user_id);
}

#[tokio::test]
async fn extractor_rejects_missing_and_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());

    let err = extract(&state, None).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.message, "No token, authorization denied");

    let err = extract(&state, Some("Bearer not.a.jwt")).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.message, "Token is not valid");

    let err = extract(&state, Some("Bearer")).await.unwrap_err();
    assert_eq!(err.message, "No token, authorization denied");
}

#[test]
fn ensure_is_only_admits_same_user() {
    let me = Uuid::new_v4();
    let auth = AuthUser { user_id: me };
    assert!(auth.ensure_is(me).is_ok());
    assert_eq!(auth.ensure_is(Uuid::new_v4()).unwrap_err().status, StatusCode::FORBIDDEN);
}

#[test]
fn register_body_tolerates_missing_fields() {
    let body: RegisterBody = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
    assert!(body.name.is_empty());
    assert!(body.password.is_empty());
    assert_eq!(body.email, "a@b.co");
}

#[test]
fn otp_bodies_use_camel_case() {
    let id = Uuid::new_v4();
    let body: VerifyOtpBody = serde_json::from_value(serde_json::json!({ "userId": id, "otp": "123456" })).unwrap();
    assert_eq!(body.user_id, id);
    assert_eq!(body.otp, "123456");
    let body: ResendOtpBody = serde_json::from_value(serde_json::json!({ "userId": id })).unwrap();
    assert_eq!(body.user_id, id);
}

fn summary() -> UserSummary {
    UserSummary { id: Uuid::new_v4(), name: "Ada".into(), email: "ada@example.com".into() }
}

#[tokio::test]
async fn pending_registration_gets_no_token() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_app_state(dir.path());
    assert!(state.config.require_email_verification);
    let user = summary();

    let body = serde_json::to_value(RegisterResponse::for_user(&state, user.clone()).unwrap()).unwrap();
    assert_eq!(body["userId"], serde_json::json!(user.id));
    assert_eq!(body["message"], "Registration initiated. Please verify your email.");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn registration_without_verification_signs_in() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = test_app_state(dir.path());
    let mut config = (*state.config).clone();
    config.require_email_verification = false;
    state.config = std::sync::Arc::new(config);
    let user = summary();

    let body = serde_json::to_value(RegisterResponse::for_user(&state, user.clone()).unwrap()).unwrap();
    let token = body["token"].as_str().unwrap();
    assert_eq!(body["user"]["id"], serde_json::json!(user.id));

    let auth = extract(&state, Some(&format!("Bearer {token}"))).await.unwrap();
    assert_eq!(auth.user_id, user.id);
}
