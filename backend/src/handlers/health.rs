//! Health check and capability handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{CropType, Domain, Language};

use crate::services::telemetry_cache::CacheStats;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub telemetry_cache: CacheStats,
    pub text_generation: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let text_generation = if state.config.generation.is_enabled() {
        "configured"
    } else {
        "templated"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        telemetry_cache: state.advisory.telemetry().cache_stats(),
        text_generation: text_generation.to_string(),
    })
}

#[derive(Serialize)]
pub struct DomainCapability {
    pub domain: Domain,
    pub agent: &'static str,
    pub name_en: &'static str,
    pub name_hi: &'static str,
}

#[derive(Serialize)]
pub struct CapabilitiesResponse {
    pub domains: Vec<DomainCapability>,
    pub languages: Vec<Language>,
    pub crops: Vec<CropType>,
    pub monitoring_points: usize,
}

/// What the advisor can answer
pub async fn capabilities(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    let domains = Domain::ALL
        .into_iter()
        .map(|domain| DomainCapability {
            domain,
            agent: domain.agent_name(),
            name_en: domain.display_name(Language::English),
            name_hi: domain.display_name(Language::Hindi),
        })
        .collect();

    Json(CapabilitiesResponse {
        domains,
        languages: vec![Language::English, Language::Hindi, Language::Mixed],
        crops: state.advisory.enrichment().calibration().crops(),
        monitoring_points: state.advisory.telemetry().registry().len(),
    })
}
