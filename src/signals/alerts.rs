//! Alert text pushed to the notification channel

use chrono::{DateTime, TimeZone};

use super::classification::SignalClass;

/// Alert for an actionable signal. Neutral readings produce no alert.
pub fn signal_alert<Tz>(
    symbol: &str,
    signal: SignalClass,
    rsi: f64,
    at: &DateTime<Tz>,
) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let headline = match signal {
        SignalClass::Oversold => format!("📉 RSI below 30 - buy opportunity {}", symbol),
        SignalClass::Overbought => format!("📈 RSI above 70 - sell opportunity {}", symbol),
        SignalClass::Neutral => return None,
    };
    Some(format!(
        "{}\nRSI: {:.2}\nTime: {}",
        headline,
        rsi,
        at.format("%H:%M")
    ))
}

pub fn feed_unavailable_alert(symbol: &str) -> String {
    format!("⚠️ Unable to fetch price data for {}", symbol)
}

pub fn cycle_error_alert(symbol: &str) -> String {
    format!("⚠️ RSI monitor error while checking {}", symbol)
}
