use super::*;

// =============================================================================
// env_bool: unique env var names keep parallel tests from racing.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on", " TRUE "].iter().enumerate() {
        let key = format!("__PW_TEST_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "Off"].iter().enumerate() {
        let key = format!("__PW_TEST_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_garbage_and_unset_are_none() {
    let key = "__PW_TEST_EB_GARBAGE_311__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__PW_TEST_EB_NEVER_SET_312__"), None);
}

// =============================================================================
// env_parse / env_parse_strict
// =============================================================================

#[test]
fn env_parse_falls_back_on_malformed() {
    let key = "__PW_TEST_EP_BAD_401__";
    unsafe { std::env::set_var(key, "lots") };
    assert_eq!(env_parse::<u32>(key, 7), 7);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_reads_value() {
    let key = "__PW_TEST_EP_OK_402__";
    unsafe { std::env::set_var(key, "42") };
    assert_eq!(env_parse::<u32>(key, 7), 42);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_strict_rejects_malformed() {
    let key = "__PW_TEST_EPS_BAD_403__";
    unsafe { std::env::set_var(key, "eighty") };
    let err = env_parse_strict::<u16>(key, 80).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { value, .. } if value == "eighty"));
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_strict_defaults_when_unset() {
    assert_eq!(env_parse_strict::<u16>("__PW_TEST_EPS_UNSET_404__", 80).unwrap(), 80);
}
