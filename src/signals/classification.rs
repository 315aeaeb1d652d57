//! Threshold classification of RSI values

use serde::{Deserialize, Serialize};
use std::fmt;

pub const OVERSOLD_THRESHOLD: f64 = 30.0;
pub const OVERBOUGHT_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalClass {
    Oversold,
    Overbought,
    Neutral,
}

impl SignalClass {
    /// Classify an RSI value. Both thresholds are exclusive: 30 and 70 are neutral.
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi < OVERSOLD_THRESHOLD {
            SignalClass::Oversold
        } else if rsi > OVERBOUGHT_THRESHOLD {
            SignalClass::Overbought
        } else {
            SignalClass::Neutral
        }
    }

    /// Whether this class warrants an alert
    pub fn is_actionable(self) -> bool {
        !matches!(self, SignalClass::Neutral)
    }
}

impl fmt::Display for SignalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalClass::Oversold => write!(f, "oversold"),
            SignalClass::Overbought => write!(f, "overbought"),
            SignalClass::Neutral => write!(f, "neutral"),
        }
    }
}
