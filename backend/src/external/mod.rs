//! External API integrations

pub mod generation;

pub use generation::{GeminiClient, GenerationPrompt, TextGenerator};
