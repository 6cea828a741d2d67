//! Configuration management for the advisory server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AGRI_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Telemetry acquisition and cache settings
    pub telemetry: TelemetryConfig,

    /// Intent classifier thresholds
    pub classifier: ClassifierConfig,

    /// Confidence fusion settings
    pub fusion: FusionConfig,

    /// External text-generation service
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Snapshot cache time-to-live in seconds
    pub cache_ttl_secs: u64,

    /// Coordinates farther than this from every monitoring point are rejected
    pub max_fallback_distance_km: f64,

    /// Coordinates this close to a point resolve without penalty
    pub exact_match_radius_km: f64,

    /// Confidence penalty at the maximum fallback distance
    pub max_distance_penalty: f64,

    /// Monitoring point used when a request names no location
    pub default_location: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Pattern-match confidence required to skip the semantic fallback
    pub min_confidence: f64,

    /// Top two domains closer than this are treated as a tie
    pub tie_epsilon: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FusionConfig {
    /// Global cap on fused confidence
    pub confidence_ceiling: f64,

    /// Maximum boost contributed by fully confident telemetry
    pub telemetry_boost: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Text-generation API endpoint
    pub api_endpoint: String,

    /// API key; empty disables the external generator
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Output token cap
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::builder_with_defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRI_ prefix)
            .add_source(
                Environment::with_prefix("AGRI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration built from code defaults only
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder_with_defaults("test")?.build()?.try_deserialize()
    }

    fn builder_with_defaults(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("telemetry.cache_ttl_secs", 3600)?
            .set_default("telemetry.max_fallback_distance_km", 150.0)?
            .set_default("telemetry.exact_match_radius_km", 5.0)?
            .set_default("telemetry.max_distance_penalty", 0.2)?
            .set_default("telemetry.default_location", "ludhiana")?
            .set_default("classifier.min_confidence", 0.5)?
            .set_default("classifier.tie_epsilon", 0.05)?
            .set_default("fusion.confidence_ceiling", 0.95)?
            .set_default("fusion.telemetry_boost", 0.10)?
            .set_default(
                "generation.api_endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("generation.api_key", "")?
            .set_default("generation.model", "gemini-2.5-flash")?
            .set_default("generation.timeout_ms", 8000)?
            .set_default("generation.temperature", 0.7)?
            .set_default("generation.max_output_tokens", 2000)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let config = Config::defaults().unwrap();
        assert_eq!(config.telemetry.cache_ttl_secs, 3600);
        assert_eq!(config.classifier.min_confidence, 0.5);
        assert_eq!(config.fusion.confidence_ceiling, 0.95);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert!(!config.generation.is_enabled());
    }
}
