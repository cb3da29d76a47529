#[test]
fn config_env_defaults_are_stable() {
    let cfg = payments_service::config::AppConfig::from_env();
    assert!(!cfg.bind_addr.is_empty());
    assert!(!cfg.stream_key.is_empty());
    assert!(cfg.webhook_tolerance_secs > 0);
}

#[test]
fn endpoints_documented_in_readme() {
    let readme = std::fs::read_to_string("README.md").unwrap_or_default();
    assert!(readme.contains("/payments"));
    assert!(readme.contains("/webhooks/processor"));
    assert!(readme.contains("/ops/readiness"));
    assert!(readme.contains("/ops/liveness"));
}
