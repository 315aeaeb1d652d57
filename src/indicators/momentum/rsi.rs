//! RSI (Relative Strength Index) indicator

use crate::models::indicators::{RsiIndicator, RsiMethod};
use tracing::warn;

/// Value returned when RSI cannot be determined (too few prices, flat market)
pub const NEUTRAL_RSI: f64 = 50.0;

pub const DEFAULT_RSI_PERIOD: u32 = 14;

/// Calculate RSI over closing prices ordered oldest to newest
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = Average Gain / Average Loss
///
/// Needs at least `period + 1` prices; shorter input yields [`NEUTRAL_RSI`].
/// The result is rounded to two decimals.
pub fn calculate_rsi(closes: &[f64], period: u32, method: RsiMethod) -> RsiIndicator {
    let n = period as usize;
    if n == 0 || closes.len() < n + 1 {
        warn!(
            prices = closes.len(),
            required = n + 1,
            "Not enough prices to compute RSI, falling back to neutral"
        );
        return RsiIndicator {
            value: NEUTRAL_RSI,
            period,
            method,
            sufficient_data: false,
        };
    }

    let (gains, losses) = gains_and_losses(closes);

    let (avg_gain, avg_loss) = match method {
        RsiMethod::Wilder => wilder_averages(&gains, &losses, n),
        RsiMethod::Simple => (mean(&gains), mean(&losses)),
    };

    RsiIndicator {
        value: round2(rsi_from_averages(avg_gain, avg_loss)),
        period,
        method,
        sufficient_data: true,
    }
}

/// Calculate RSI with the default period (14) and Wilder smoothing
pub fn calculate_rsi_default(closes: &[f64]) -> RsiIndicator {
    calculate_rsi(closes, DEFAULT_RSI_PERIOD, RsiMethod::Wilder)
}

/// Split consecutive price changes into gains and losses (both non-negative)
pub fn gains_and_losses(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip()
}

fn wilder_averages(gains: &[f64], losses: &[f64], period: usize) -> (f64, f64) {
    let p = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / p;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / p;

    for (gain, loss) in gains[period..].iter().zip(&losses[period..]) {
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    (avg_gain, avg_loss)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // Flat market: no gains and no losses
        return if avg_gain != 0.0 { 100.0 } else { NEUTRAL_RSI };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
