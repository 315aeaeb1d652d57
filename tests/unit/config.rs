//! Unit tests for configuration loading

use std::collections::HashMap;
use std::time::Duration;

use rsiwatch::config::Config;
use rsiwatch::error::ConfigError;
use rsiwatch::models::indicators::RsiMethod;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = [
        ("BINANCE_API_KEY", "key"),
        ("BINANCE_API_SECRET", "secret"),
        ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
        ("LINE_TARGET_ID", "U123"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in pairs {
        vars.insert(k.to_string(), v.to_string());
    }
    vars
}

fn load(vars: &HashMap<String, String>) -> Result<Config, ConfigError> {
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = load(&env(&[])).unwrap();
    assert_eq!(config.monitor.symbol, "BTCUSDT");
    assert_eq!(config.monitor.interval, "1m");
    assert_eq!(config.monitor.rsi_period, 14);
    assert_eq!(config.monitor.kline_limit, 100);
    assert_eq!(config.monitor.rsi_method, RsiMethod::Wilder);
    assert_eq!(config.monitor.max_retries, 3);
    assert_eq!(config.monitor.backoff_base, Duration::from_secs(5));
    assert_eq!(config.monitor.poll_interval, Duration::from_secs(60));
    assert_eq!(config.http_timeout, Duration::from_secs(10));
    assert!(config.proxy.is_none());
    assert!(config.health_port.is_none());
    assert_eq!(config.binance.api_key, "key");
    assert_eq!(config.line.target_id, "U123");
}

#[test]
fn test_each_credential_is_required() {
    for key in [
        "BINANCE_API_KEY",
        "BINANCE_API_SECRET",
        "LINE_CHANNEL_ACCESS_TOKEN",
        "LINE_TARGET_ID",
    ] {
        let mut vars = env(&[]);
        vars.remove(key);
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(key));
    }
}

#[test]
fn test_blank_credential_counts_as_missing() {
    let vars = env(&[("LINE_TARGET_ID", "  ")]);
    assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("LINE_TARGET_ID"));
}

#[test]
fn test_window_must_cover_period() {
    let err = load(&env(&[("RSI_PERIOD", "14"), ("KLINE_LIMIT", "14")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "KLINE_LIMIT", .. }));

    assert!(load(&env(&[("RSI_PERIOD", "14"), ("KLINE_LIMIT", "15")])).is_ok());
}

#[test]
fn test_maximal_period_is_rejected_without_overflow() {
    let err = load(&env(&[("RSI_PERIOD", "4294967295")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "KLINE_LIMIT", .. }));
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        ("FETCH_MAX_RETRIES", "0"),
        ("RSI_PERIOD", "0"),
        ("POLL_INTERVAL_SECONDS", "0"),
        ("RSI_PERIOD", "fourteen"),
        ("RSI_METHOD", "ema"),
        ("HEALTH_PORT", "99999"),
    ];
    for (key, value) in cases {
        let err = load(&env(&[(key, value)])).unwrap_err();
        match err {
            ConfigError::Invalid { key: k, .. } => assert_eq!(k, key),
            other => panic!("expected invalid {}, got {:?}", key, other),
        }
    }
}

#[test]
fn test_overrides() {
    let config = load(&env(&[
        ("SYMBOL", "ETHUSDT"),
        ("KLINE_INTERVAL", "5m"),
        ("RSI_METHOD", "simple"),
        ("FETCH_MAX_RETRIES", "5"),
        ("FETCH_BACKOFF_SECONDS", "2"),
        ("POLL_INTERVAL_SECONDS", "300"),
        ("HEALTH_PORT", "8080"),
    ]))
    .unwrap();
    assert_eq!(config.monitor.symbol, "ETHUSDT");
    assert_eq!(config.monitor.interval, "5m");
    assert_eq!(config.monitor.rsi_method, RsiMethod::Simple);
    assert_eq!(config.monitor.max_retries, 5);
    assert_eq!(config.monitor.backoff_base, Duration::from_secs(2));
    assert_eq!(config.monitor.poll_interval, Duration::from_secs(300));
    assert_eq!(config.health_port, Some(8080));
}

#[test]
fn test_proxy_rotation_enabled_by_list_url() {
    let config = load(&env(&[("PROXY_LIST_URL", "https://example.test/proxies.txt")])).unwrap();
    let proxy = config.proxy.expect("proxy config");
    assert_eq!(proxy.list_url, "https://example.test/proxies.txt");
    assert_eq!(proxy.refresh_interval, Duration::from_secs(10_800));
    assert_eq!(proxy.max_attempts, 10);
    assert_eq!(proxy.probe_timeout, Duration::from_secs(5));
}
