//! Pipeline services for the advisory server

pub mod advisory;
pub mod classifier;
pub mod enrichment;
pub mod fusion;
pub mod specialists;
pub mod synthesis;
pub mod telemetry;
pub mod telemetry_cache;

pub use advisory::AdvisoryService;
pub use classifier::IntentClassifier;
pub use enrichment::EnrichmentService;
pub use fusion::FusionService;
pub use synthesis::ResponseSynthesizer;
pub use telemetry::{SimulatedTelemetryProvider, TelemetryProvider, TelemetryService};
pub use telemetry_cache::TelemetryCache;
