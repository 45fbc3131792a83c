use super::*;
use uuid::Uuid;

#[tokio::test]
async fn new_state_wires_config_into_services() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_helpers::test_app_state(dir.path());

    assert_eq!(state.config.public_base_url, "http://localhost:3000");
    let user_id = Uuid::new_v4();
    let token = state.tokens.issue(user_id).unwrap();
    assert_eq!(state.tokens.verify(&token).unwrap(), user_id);

    let stored = state.uploads.upload(b"pixels", Some("a.png"), Some("image/png")).await.unwrap();
    assert!(stored.url.starts_with("http://localhost:3000/uploads/"));
    assert!(dir.path().join(&stored.file_name).exists());
}

#[tokio::test]
async fn clones_share_limiter_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_helpers::test_app_state(dir.path());
    let clone = state.clone();

    assert!(Arc::ptr_eq(&state.config, &clone.config));
    for _ in 0..100 {
        if state.limiter.check_and_record("k").is_err() {
            break;
        }
    }
    assert!(clone.limiter.check_and_record("k").is_err());
}
