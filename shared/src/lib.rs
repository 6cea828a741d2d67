//! Shared types and models for the agricultural advisory pipeline
//!
//! This crate contains the domain vocabulary used by the backend pipeline
//! and by any client consuming the structured advisory responses.

pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
