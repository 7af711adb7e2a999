//! Integration tests for configuration parsing and validation.

use sdram_controller::common::ConfigError;
use sdram_controller::config::{ns_to_cycles, Config, Timing};

/// Tests that an empty file yields the documented defaults.
#[test]
fn test_empty_config_uses_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.clock.frequency_hz, 100_000_000);
    assert_eq!(config.burst.burst_length, 8);
    assert_eq!(config.burst.bursts_per_turn, 2);
    assert_eq!(config.channels.count, 1);
    assert_eq!(config.timing.refresh_threshold, 4);
    assert!(!config.general.trace_commands);
}

/// Tests that a partial file overrides only the fields it names.
#[test]
fn test_partial_config() {
    let text = r#"
        [clock]
        frequency_hz = 50_000_000

        [channels]
        count = 3
        window_words = 1024
    "#;
    let config = Config::from_toml(text).unwrap();
    assert_eq!(config.clock.frequency_hz, 50_000_000);
    assert_eq!(config.channels.count, 3);
    assert_eq!(config.channels.window_words, 1024);
    assert_eq!(config.channels.fifo_depth, 32);
    assert_eq!(config.geometry.col_bits, 9);
}

/// Tests that malformed TOML surfaces as a parse error.
#[test]
fn test_parse_error() {
    let err = Config::from_toml("[clock]\nfrequency_hz = \"fast\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

/// Tests that a missing file surfaces as an I/O error naming the path.
#[test]
fn test_missing_file() {
    let err = Config::load("/nonexistent/sdram.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/sdram.toml"));
}

/// Tests ceiling conversion from nanoseconds to cycles.
#[test]
fn test_ns_to_cycles_rounds_up() {
    assert_eq!(ns_to_cycles(18, 100_000_000), 2);
    assert_eq!(ns_to_cycles(20, 100_000_000), 2);
    assert_eq!(ns_to_cycles(21, 100_000_000), 3);
    assert_eq!(ns_to_cycles(60, 96_000_000), 6);
    assert_eq!(ns_to_cycles(0, 100_000_000), 0);
    assert_eq!(ns_to_cycles(64_000_000, 100_000_000), 6_400_000);
    assert_eq!(ns_to_cycles(u64::MAX, u64::MAX), u64::MAX);
}

/// Tests the cycle-level timing derived from the defaults.
#[test]
fn test_default_timing() {
    let timing = Timing::from_config(&Config::default()).unwrap();
    assert_eq!(timing.startup, 10_000);
    assert_eq!(timing.t_rp, 2);
    assert_eq!(timing.t_mrd, 2);
    assert_eq!(timing.t_wr, 2);
    assert_eq!(timing.read_latency, 4);
    assert_eq!(timing.turn_words(), 16);
    assert_eq!(timing.refresh_period, 6_400_000);
    assert_eq!(timing.mode_register.encode(), 0x33);
}

/// Tests that one burst lasts long enough for the slowest bank recovery.
#[test]
fn test_burst_cycles_cover_recovery() {
    let mut config = Config::default();
    config.timing.t_rc_ns = 200;
    let timing = Timing::from_config(&config).unwrap();
    assert_eq!(timing.burst_cycles, 20);

    config.timing.t_rc_ns = 60;
    config.timing.t_wr_ns = 50;
    let timing = Timing::from_config(&config).unwrap();
    assert_eq!(timing.burst_cycles, 2 + 8 + 5 + 2);
}

fn invalid_field(config: &Config) -> &'static str {
    match Timing::from_config(config) {
        Err(ConfigError::Invalid { field, .. }) => field,
        other => panic!("expected a validation error, got {:?}", other.map(|_| ())),
    }
}

/// Tests channel validation rules.
#[test]
fn test_channel_validation() {
    let mut config = Config::default();
    config.channels.window_words = 24;
    assert_eq!(invalid_field(&config), "channels.window_words");

    config.channels.window_words = 16;
    assert_eq!(invalid_field(&config), "channels.window_words");

    let mut config = Config::default();
    config.channels.count = 0;
    assert_eq!(invalid_field(&config), "channels.count");

    let mut config = Config::default();
    config.channels.fifo_depth = 8;
    assert_eq!(invalid_field(&config), "channels.fifo_depth");

    let mut config = Config::default();
    config.geometry.row_bits = 1;
    config.geometry.bank_bits = 0;
    config.channels.count = 2;
    config.channels.window_words = 1024;
    assert_eq!(invalid_field(&config), "channels.window_words");
}

/// Tests timing and geometry validation rules.
#[test]
fn test_timing_validation() {
    let mut config = Config::default();
    config.clock.frequency_hz = 0;
    assert_eq!(invalid_field(&config), "clock.frequency_hz");

    let mut config = Config::default();
    config.burst.burst_length = 3;
    assert_eq!(invalid_field(&config), "burst_length");

    let mut config = Config::default();
    config.timing.cas_latency = 4;
    assert_eq!(invalid_field(&config), "cas_latency");

    let mut config = Config::default();
    config.geometry.col_bits = 11;
    assert_eq!(invalid_field(&config), "geometry.col_bits");

    let mut config = Config::default();
    config.timing.refreshes_per_period = 6_400_000;
    assert_eq!(invalid_field(&config), "timing.refreshes_per_period");

    let mut config = Config::default();
    config.timing.t_rc_ns = u64::MAX / 1_000;
    assert_eq!(invalid_field(&config), "timing.t_rc_ns");

    let mut config = Config::default();
    config.timing.t_rp_ns = 42_949_672_900;
    assert_eq!(invalid_field(&config), "timing");
}

/// Tests that a refresh threshold is only accepted when a request raised at
/// it can still be served before the budget runs out.
#[test]
fn test_refresh_threshold_validation() {
    let mut config = Config::default();
    config.timing.t_refresh_period_ns = 200_000;
    config.timing.refreshes_per_period = 100;

    config.timing.refresh_threshold = 100;
    assert_eq!(invalid_field(&config), "timing.refresh_threshold");

    config.timing.refresh_threshold = 99;
    assert_eq!(invalid_field(&config), "timing.refresh_threshold");

    config.timing.refresh_threshold = 98;
    assert!(Timing::from_config(&config).is_ok());

    // Every extra channel adds a turn the request may wait behind.
    config.timing.refreshes_per_period = 1_000;
    config.timing.refresh_threshold = 997;
    assert!(Timing::from_config(&config).is_ok());
    config.channels.count = 2;
    assert_eq!(invalid_field(&config), "timing.refresh_threshold");
}

/// Tests that the shipped configuration file loads and validates.
#[test]
fn test_shipped_config() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/default.toml");
    let config = Config::load(path).unwrap();
    assert_eq!(config.channels.count, 2);
    let timing = Timing::from_config(&config).unwrap();
    assert_eq!(timing.burst_cycles, 14);
}
