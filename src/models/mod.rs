//! Shared data models spanning the monitor layers.

pub mod indicators;
pub mod market;

pub use indicators::{RsiIndicator, RsiMethod};
pub use market::{Kline, KlineRequest, PriceSeries};
