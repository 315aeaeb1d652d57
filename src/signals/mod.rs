//! Signal classification and alert text.

pub mod alerts;
pub mod classification;

pub use alerts::*;
pub use classification::*;
