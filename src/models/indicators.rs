use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How average gain and loss are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiMethod {
    /// Seed with the mean of the first `period` moves, then smooth with weight 1/period
    #[default]
    Wilder,
    /// Plain mean over every available move
    Simple,
}

impl fmt::Display for RsiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiMethod::Wilder => write!(f, "wilder"),
            RsiMethod::Simple => write!(f, "simple"),
        }
    }
}

impl FromStr for RsiMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wilder" | "smoothed" => Ok(RsiMethod::Wilder),
            "simple" | "sma" => Ok(RsiMethod::Simple),
            other => Err(format!("unknown RSI method '{}' (expected wilder or simple)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiIndicator {
    pub value: f64,
    pub period: u32,
    pub method: RsiMethod,
    /// False when the series was too short and `value` is the neutral fallback
    pub sufficient_data: bool,
}
