//! Error types for the monitor

use thiserror::Error;

/// Startup configuration errors. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A single failed fetch from the price feed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("feed returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode feed response: {0}")]
    Decode(String),

    #[error("insufficient klines: received {received}, need at least 2")]
    InsufficientData { received: usize },
}

/// Acquisition failed after exhausting every attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquireError {
    #[error("price feed unavailable for {symbol} after {attempts} attempts: {source}")]
    FeedUnavailable {
        symbol: String,
        attempts: u32,
        #[source]
        source: FeedError,
    },
}

/// Delivery to the notification channel failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("notifier transport error: {0}")]
    Transport(String),

    #[error("notifier returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Proxy list harvesting or probing failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("proxy list request failed: {0}")]
    Harvest(String),

    #[error("invalid proxy address {0:?}")]
    InvalidAddress(String),
}

/// Unexpected failure inside a polling cycle. Logged and reported,
/// never fatal to the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("RSI evaluation produced a non-finite value for {symbol}")]
    NonFiniteRsi { symbol: String },

    #[error("cycle panicked: {0}")]
    Panicked(String),
}
