#[path = "common/mod.rs"]
mod common;

use common::ReelTest;

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let reel = ReelTest::new();
    let stdout = reel.run_success(&["config", "show"]);
    assert!(stdout.contains("debounce_ms: 1000"));
    assert!(stdout.contains("trending_limit: 5"));
    assert!(stdout.contains("not configured"));
}

#[test]
fn test_config_set_then_get() {
    let reel = ReelTest::new();
    reel.run_success(&["config", "set", "search.debounce_ms", "250"]);
    assert!(reel.config_exists());

    let stdout = reel.run_success(&["config", "get", "search.debounce_ms"]);
    assert_eq!(stdout.trim(), "250");
}

#[test]
fn test_config_set_on_fresh_install_writes_default_timeout() {
    let reel = ReelTest::new();
    reel.run_success(&["config", "set", "search.trending_limit", "8"]);

    let stdout = reel.run_success(&["config", "get", "remote_timeout"]);
    assert_eq!(stdout.trim(), "30");
}

#[test]
fn test_config_rejects_zero_timeout() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["config", "set", "remote_timeout", "0"]);
    assert!(stderr.contains("at least 1 second"));
    assert!(!reel.config_exists());
}

#[test]
fn test_config_set_masks_secret_in_json() {
    let reel = ReelTest::new();
    let stdout = reel.run_success(&["config", "set", "catalog.api_key", "abcdefgh", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["value"], "ab...gh");
    assert_eq!(json["success"], true);
}

#[test]
fn test_config_get_not_set() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["config", "get", "backend.url"]);
    assert!(stderr.contains("is not set"));
}

#[test]
fn test_config_set_invalid_key() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["config", "set", "github.token", "x"]);
    assert!(stderr.contains("unknown config key"));
    assert!(!reel.config_exists());
}

#[test]
fn test_config_set_rejects_bad_values() {
    let reel = ReelTest::new();
    reel.run_failure(&["config", "set", "search.debounce_ms", "soon"]);
    reel.run_failure(&["config", "set", "backend.url", "not a url"]);
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_whoami_when_signed_out() {
    let reel = ReelTest::new();
    let stdout = reel.run_success(&["whoami"]);
    assert!(stdout.contains("not signed in"));

    let stdout = reel.run_success(&["whoami", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["user_id"].is_null());
}

#[test]
fn test_whoami_reads_persisted_identity() {
    let reel = ReelTest::new();
    reel.write_identity("user-42");

    let stdout = reel.run_success(&["whoami"]);
    assert_eq!(stdout.trim(), "user-42");
}

// ============================================================================
// Input validation happens before any remote call
// ============================================================================

#[test]
fn test_details_rejects_non_numeric_id() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["details", "abc"]);
    assert!(stderr.contains("invalid movie id 'abc'"));
}

#[test]
fn test_comments_reject_zero_id() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["comments", "0"]);
    assert!(stderr.contains("invalid movie id"));
}

#[test]
fn test_search_rejects_blank_query() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["search", "   "]);
    assert!(stderr.contains("search query cannot be empty"));
}

#[test]
fn test_signup_rejects_weak_password() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&[
        "signup",
        "--name",
        "Ann",
        "ann@example.com",
        "--password",
        "short",
        "--confirm",
        "short",
    ]);
    assert!(stderr.contains("validation failed"));
}

#[test]
fn test_search_without_catalog_key_fails() {
    let reel = ReelTest::new();
    let stderr = reel.run_failure(&["search", "batman"]);
    assert!(stderr.contains("configuration error"));
}
