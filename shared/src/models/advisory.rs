//! Advisory request/response wire types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    ClassificationSource, CropType, Domain, LocationInput, MarketOutlook, RiskLevel,
    StressFactor, VegetationHealth,
};
use crate::types::Language;

/// Incoming advisory question
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdvisoryRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query_text: String,
    pub language: Option<Language>,
    pub location: Option<LocationInput>,
    #[validate(length(min = 1, max = 128))]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: AdvisoryContext,
}

/// Optional hints supplied alongside the query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisoryContext {
    /// Crop name in any supported script
    pub crop: Option<String>,
    /// Date the telemetry should describe; defaults to today
    pub date: Option<NaiveDate>,
}

impl AdvisoryContext {
    pub fn crop(&self) -> Option<CropType> {
        self.crop.as_deref().and_then(CropType::parse)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    ClarificationNeeded,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingAnalysis {
    pub agent: Domain,
    pub confidence: f64,
    pub reasoning: String,
    pub language_detected: Language,
    pub source: ClassificationSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteData {
    pub location_id: String,
    pub date: NaiveDate,
    pub ndvi: f64,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub cloud_cover: f64,
    pub data_confidence: f64,
    pub environmental_score: f64,
    pub risk_level: RiskLevel,
    pub stress_factors: Vec<StressFactor>,
    pub vegetation_health: VegetationHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInsight {
    pub crop: CropType,
    pub expected_yield_t_ha: f64,
    pub yield_ratio: f64,
    pub price_adjustment: f64,
    pub outlook: MarketOutlook,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_price_per_quintal: Option<Decimal>,
    /// Forecast fell back to the neutral base-yield estimate
    #[serde(default)]
    pub forecast_degraded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clarification {
    pub candidates: Vec<Domain>,
    pub question: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Generated,
    Templated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalMetrics {
    pub processing_time_ms: u64,
    pub confidence_level: f64,
    pub satellite_data_integrated: bool,
    /// Upper-case risk label, `UNKNOWN` without telemetry
    pub risk_assessment: String,
    pub agent: String,
    pub text_source: TextSource,
}

/// Structured advisory answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    pub status: ResponseStatus,
    pub query_id: Uuid,
    pub original_query: String,
    pub routing_analysis: RoutingAnalysis,
    pub satellite_data: Option<SatelliteData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketInsight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<Clarification>,
    pub response_text: String,
    pub technical_metrics: TechnicalMetrics,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        let request: AdvisoryRequest =
            serde_json::from_str(r#"{"query_text": "mera gehun kab bechun?"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.context.crop().is_none());

        let empty: AdvisoryRequest = serde_json::from_str(r#"{"query_text": ""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_context_crop_parsing() {
        let request: AdvisoryRequest = serde_json::from_str(
            r#"{"query_text": "x", "language": "hi", "context": {"crop": "Gehun", "date": "2024-03-01"}}"#,
        )
        .unwrap();
        assert_eq!(request.language, Some(Language::Hindi));
        assert_eq!(request.context.crop(), Some(CropType::Wheat));
        assert_eq!(
            request.context.date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(ResponseStatus::ClarificationNeeded).unwrap(),
            "clarification_needed"
        );
    }
}
