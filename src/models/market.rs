//! Market data records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fixed-interval OHLC record from the price feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
}

/// Parameters of a single kline request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    pub symbol: String,
    pub interval: String,
    pub limit: u32,
}

impl KlineRequest {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, limit: u32) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            limit,
        }
    }
}

/// Closing prices ordered oldest to newest. Built fresh every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, closes: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            closes,
        }
    }

    pub fn from_klines(symbol: impl Into<String>, klines: &[Kline]) -> Self {
        Self::new(symbol, klines.iter().map(|k| k.close).collect())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.last().copied()
    }
}
