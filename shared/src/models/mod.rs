//! Domain models for the advisory pipeline

mod advisory;
mod crop;
mod domain;
mod forecast;
mod location;
mod query;
mod recommendation;
mod risk;
mod telemetry;

pub use advisory::*;
pub use crop::*;
pub use domain::*;
pub use forecast::*;
pub use location::*;
pub use query::*;
pub use recommendation::*;
pub use risk::*;
pub use telemetry::*;
