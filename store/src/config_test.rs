#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn defaults_match_canvas_thresholds() {
    let config = StoreConfig::default();
    assert_eq!(config.min_region_px, 12);
    assert_eq!(config.dedup_threshold, 0.82);
    assert_eq!(config.max_connections, 1);
    assert!(config.database_url.starts_with("sqlite://"));
}

#[test]
fn in_memory_uses_memory_url() {
    let config = StoreConfig::in_memory();
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.max_connections, 1);
}

#[test]
fn sanitized_replaces_bad_values() {
    let config = StoreConfig { max_connections: 0, min_region_px: -3, dedup_threshold: 1.5, ..StoreConfig::in_memory() }
        .sanitized();
    assert_eq!(config.max_connections, 1);
    assert_eq!(config.min_region_px, 12);
    assert_eq!(config.dedup_threshold, 0.82);
}

#[test]
fn sanitized_keeps_good_values() {
    let config = StoreConfig { min_region_px: 20, dedup_threshold: 0.5, ..StoreConfig::in_memory() };
    assert_eq!(config.clone().sanitized(), config);
}

#[test]
fn env_parse_falls_back_on_missing_key() {
    assert_eq!(env_parse("STORE_TEST_SURELY_UNSET_KEY", 42_u32), 42);
}

#[test]
fn nan_threshold_is_rejected() {
    let config = StoreConfig { dedup_threshold: f64::NAN, ..StoreConfig::in_memory() }.sanitized();
    assert_eq!(config.dedup_threshold, 0.82);
}
