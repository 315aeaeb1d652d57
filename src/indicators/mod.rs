//! Technical indicators computed from price series.

pub mod momentum;

pub use momentum::*;
