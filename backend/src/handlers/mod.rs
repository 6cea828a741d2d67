//! HTTP request handlers

mod advisory;
mod health;
mod telemetry;

pub use advisory::*;
pub use health::*;
pub use telemetry::*;
