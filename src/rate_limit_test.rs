use super::*;

const WINDOW: Duration = Duration::from_secs(60);

#[test]
fn allows_up_to_limit_then_refuses() {
    let rl = AttemptLimiter::with_limits(3, WINDOW);
    let now = Instant::now();

    for i in 0..3 {
        assert!(rl.check_and_record_at("login:ada@example.com", now).is_ok(), "attempt {i} should succeed");
    }
    let err = rl.check_and_record_at("login:ada@example.com", now).unwrap_err();
    assert_eq!(err.retry_after_secs, 60);
}

#[test]
fn window_expiry_allows_new_attempts() {
    let rl = AttemptLimiter::with_limits(2, WINDOW);
    let start = Instant::now();

    rl.check_and_record_at("k", start).unwrap();
    rl.check_and_record_at("k", start).unwrap();
    assert!(rl.check_and_record_at("k", start).is_err());

    let after_window = start + WINDOW + Duration::from_millis(1);
    assert!(rl.check_and_record_at("k", after_window).is_ok());
}

#[test]
fn retry_after_counts_down_from_oldest_attempt() {
    let rl = AttemptLimiter::with_limits(1, WINDOW);
    let start = Instant::now();
    rl.check_and_record_at("k", start).unwrap();

    let err = rl.check_and_record_at("k", start + Duration::from_secs(45)).unwrap_err();
    assert_eq!(err.retry_after_secs, 15);
}

#[test]
fn distinct_keys_do_not_interfere() {
    let rl = AttemptLimiter::with_limits(1, WINDOW);
    let now = Instant::now();

    rl.check_and_record_at("otp:a", now).unwrap();
    assert!(rl.check_and_record_at("otp:a", now).is_err());
    assert!(rl.check_and_record_at("otp:b", now).is_ok());
}

#[test]
fn reset_clears_a_key() {
    let rl = AttemptLimiter::with_limits(1, WINDOW);
    rl.check_and_record("k").unwrap();
    assert!(rl.check_and_record("k").is_err());

    rl.reset("k");
    assert!(rl.check_and_record("k").is_ok());
}

#[test]
fn clones_share_state() {
    let rl = AttemptLimiter::with_limits(1, WINDOW);
    let clone = rl.clone();
    rl.check_and_record("k").unwrap();
    assert!(clone.check_and_record("k").is_err());
}

#[test]
fn prune_drops_expired_keys() {
    let rl = AttemptLimiter::with_limits(5, Duration::ZERO);
    rl.check_and_record_at("old", Instant::now() - Duration::from_secs(1)).unwrap();
    rl.prune();
    let attempts = rl.attempts.lock().unwrap();
    assert!(attempts.is_empty());
}
