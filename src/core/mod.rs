//! Core application primitives (cycle, scheduling, wiring, health)

pub mod clock;
pub mod cycle;
pub mod http;
pub mod runtime;
pub mod scheduler;

pub use clock::*;
pub use cycle::*;
pub use http::*;
pub use runtime::*;
pub use scheduler::*;
