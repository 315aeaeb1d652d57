//! Environment-based configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::indicators::RsiMethod;

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_INTERVAL: &str = "1m";
pub const DEFAULT_RSI_PERIOD: u32 = 14;
pub const DEFAULT_KLINE_LIMIT: u32 = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_SECONDS: u64 = 5;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_LINE_API_URL: &str = "https://api.line.me";
pub const DEFAULT_PROXY_PROBE_URL: &str = "https://api.binance.com/api/v3/ping";
pub const DEFAULT_PROXY_REFRESH_SECONDS: u64 = 3 * 60 * 60;
pub const DEFAULT_PROXY_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_PROXY_PROBE_TIMEOUT_SECONDS: u64 = 5;

/// Get the deployment environment (`APP_ENV`), defaulting to "sandbox"
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// Price feed credentials and endpoint
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

/// Notification channel credentials and endpoint
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub target_id: String,
    pub base_url: String,
}

/// What to sample and how to evaluate it
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub symbol: String,
    pub interval: String,
    pub kline_limit: u32,
    pub rsi_period: u32,
    pub rsi_method: RsiMethod,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            kline_limit: DEFAULT_KLINE_LIMIT,
            rsi_period: DEFAULT_RSI_PERIOD,
            rsi_method: RsiMethod::Wilder,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs(DEFAULT_BACKOFF_SECONDS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
        }
    }
}

/// Proxy rotation settings. Present only when `PROXY_LIST_URL` is set.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub list_url: String,
    pub probe_url: String,
    pub refresh_interval: Duration,
    pub max_attempts: u32,
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub binance: BinanceConfig,
    pub line: LineConfig,
    pub monitor: MonitorConfig,
    pub proxy: Option<ProxyConfig>,
    pub http_timeout: Duration,
    pub health_port: Option<u16>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_key = required("BINANCE_API_KEY")?;
        let api_secret = required("BINANCE_API_SECRET")?;
        let channel_access_token = required("LINE_CHANNEL_ACCESS_TOKEN")?;
        let target_id = required("LINE_TARGET_ID")?;

        let rsi_period: u32 = parse_or(&get, "RSI_PERIOD", DEFAULT_RSI_PERIOD)?;
        if rsi_period < 1 {
            return Err(invalid("RSI_PERIOD", rsi_period, "must be at least 1"));
        }

        let kline_limit: u32 = parse_or(&get, "KLINE_LIMIT", DEFAULT_KLINE_LIMIT)?;
        let min_limit = rsi_period.saturating_add(1);
        if kline_limit < min_limit {
            return Err(invalid(
                "KLINE_LIMIT",
                kline_limit,
                &format!("must be at least RSI_PERIOD + 1 ({})", min_limit),
            ));
        }

        let max_retries: u32 = parse_or(&get, "FETCH_MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        if max_retries < 1 {
            return Err(invalid("FETCH_MAX_RETRIES", max_retries, "must be at least 1"));
        }

        let poll_seconds: u64 =
            parse_or(&get, "POLL_INTERVAL_SECONDS", DEFAULT_POLL_INTERVAL_SECONDS)?;
        if poll_seconds < 1 {
            return Err(invalid("POLL_INTERVAL_SECONDS", poll_seconds, "must be at least 1"));
        }

        let monitor = MonitorConfig {
            symbol: get("SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            interval: get("KLINE_INTERVAL").unwrap_or_else(|| DEFAULT_INTERVAL.to_string()),
            kline_limit,
            rsi_period,
            rsi_method: parse_or(&get, "RSI_METHOD", RsiMethod::Wilder)?,
            max_retries,
            backoff_base: Duration::from_secs(parse_or(
                &get,
                "FETCH_BACKOFF_SECONDS",
                DEFAULT_BACKOFF_SECONDS,
            )?),
            poll_interval: Duration::from_secs(poll_seconds),
        };

        let proxy = match get("PROXY_LIST_URL") {
            Some(list_url) => {
                let max_attempts: u32 =
                    parse_or(&get, "PROXY_MAX_ATTEMPTS", DEFAULT_PROXY_MAX_ATTEMPTS)?;
                if max_attempts < 1 {
                    return Err(invalid("PROXY_MAX_ATTEMPTS", max_attempts, "must be at least 1"));
                }
                Some(ProxyConfig {
                    list_url,
                    probe_url: get("PROXY_PROBE_URL")
                        .unwrap_or_else(|| DEFAULT_PROXY_PROBE_URL.to_string()),
                    refresh_interval: Duration::from_secs(parse_or(
                        &get,
                        "PROXY_REFRESH_SECONDS",
                        DEFAULT_PROXY_REFRESH_SECONDS,
                    )?),
                    max_attempts,
                    probe_timeout: Duration::from_secs(parse_or(
                        &get,
                        "PROXY_PROBE_TIMEOUT_SECONDS",
                        DEFAULT_PROXY_PROBE_TIMEOUT_SECONDS,
                    )?),
                })
            }
            None => None,
        };

        let health_port: u16 = parse_or(&get, "HEALTH_PORT", 0)?;

        Ok(Self {
            binance: BinanceConfig {
                api_key,
                api_secret,
                base_url: get("BINANCE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BINANCE_BASE_URL.to_string()),
            },
            line: LineConfig {
                channel_access_token,
                target_id,
                base_url: get("LINE_API_URL").unwrap_or_else(|| DEFAULT_LINE_API_URL.to_string()),
            },
            monitor,
            proxy,
            http_timeout: Duration::from_secs(parse_or(
                &get,
                "HTTP_TIMEOUT_SECONDS",
                DEFAULT_HTTP_TIMEOUT_SECONDS,
            )?),
            health_port: (health_port > 0).then_some(health_port),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
