use super::*;

// =============================================================================
// env_parse / env_bool — unique env var names avoid races with parallel tests.
// =============================================================================

#[test]
fn env_parse_reads_value() {
    let key = "__TEST_PG_PARSE_OK_311__";
    unsafe { std::env::set_var(key, " 42 ") };
    assert_eq!(env_parse::<u64>(key, 7), 42);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_invalid_falls_back() {
    let key = "__TEST_PG_PARSE_BAD_312__";
    unsafe { std::env::set_var(key, "soon") };
    assert_eq!(env_parse::<u16>(key, 3000), 3000);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_parse_unset_falls_back() {
    assert_eq!(env_parse::<u64>("__TEST_PG_PARSE_UNSET_313__", 9), 9);
}

#[test]
fn env_bool_variants() {
    for (i, (val, expected)) in [("1", Some(true)), ("On", Some(true)), ("no", Some(false)), ("maybe", None)]
        .iter()
        .enumerate()
    {
        let key = format!("__TEST_PG_BOOL_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), *expected, "unexpected result for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

// =============================================================================
// GatewayConfig::from_env — shared globals, so everything lives in one test.
// =============================================================================

unsafe fn clear_gateway_env() {
    unsafe {
        for key in [
            "IDENTITY_URL",
            "PORT",
            "IDENTITY_REQUEST_TIMEOUT_SECS",
            "IDENTITY_CONNECT_TIMEOUT_SECS",
            "GUARD_CONFIG_PATH",
            "GUARD_FAIL_CLOSED",
            "STATIC_DIR",
        ] {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn from_env_lifecycle() {
    unsafe { clear_gateway_env() };
    assert!(matches!(GatewayConfig::from_env(), Err(GatewayConfigError::Missing("IDENTITY_URL"))));

    unsafe { std::env::set_var("IDENTITY_URL", "   ") };
    assert!(GatewayConfig::from_env().is_err());

    unsafe { std::env::set_var("IDENTITY_URL", "http://identity.local/userinfo") };
    let config = GatewayConfig::from_env().unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.identity_url, "http://identity.local/userinfo");
    assert_eq!(config.identity_timeouts, IdentityTimeouts::default());
    assert_eq!(config.on_failure, FailurePolicy::Propagate);
    assert_eq!(config.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
    assert!(config.guard_config_path.is_none());
    assert_eq!(config.guard_table().unwrap(), default_table());

    unsafe {
        std::env::set_var("PORT", "8081");
        std::env::set_var("IDENTITY_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("GUARD_FAIL_CLOSED", "true");
        std::env::set_var("STATIC_DIR", "/srv/site");
        std::env::set_var("GUARD_CONFIG_PATH", "/nonexistent/guards.yaml");
    }
    let config = GatewayConfig::from_env().unwrap();
    assert_eq!(config.port, 8081);
    assert_eq!(config.identity_timeouts.request_secs, 30);
    assert_eq!(config.identity_timeouts.connect_secs, DEFAULT_IDENTITY_CONNECT_TIMEOUT_SECS);
    assert_eq!(config.on_failure, FailurePolicy::FailClosed);
    assert_eq!(config.static_dir, PathBuf::from("/srv/site"));
    assert!(matches!(config.guard_table(), Err(ConfigError::Read { .. })));

    unsafe { clear_gateway_env() };
}
