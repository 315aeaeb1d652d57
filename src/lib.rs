//! RSI watch: samples recent klines for a trading pair, computes RSI and
//! pushes an alert when the market turns overbought or oversold.

pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;

pub use config::Config;
pub use error::{AcquireError, ConfigError, CycleError, FeedError, NotifyError, ProxyError};
