//! End-to-end advisory pipeline tests
//!
//! Drives the full query path (classification, telemetry, enrichment,
//! fusion, synthesis) with controlled providers, then the HTTP surface.

use agri_advisory::config::Config;
use agri_advisory::error::{AppError, AppResult};
use agri_advisory::external::{GenerationPrompt, TextGenerator};
use agri_advisory::services::telemetry::{SimulatedTelemetryProvider, TelemetryProvider};
use agri_advisory::services::AdvisoryService;
use agri_advisory::{create_app, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::{
    AdvisoryContext, AdvisoryRequest, CalibrationTable, CropCalibration, CropType, Domain, GpsCoordinates,
    Language, Location, LocationInput, LocationRegistry, MarketOutlook, ResponseStatus,
    TelemetryReading, TelemetrySnapshot, TextSource,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Provider that reports the same field conditions everywhere
struct FixedProvider {
    ndvi: f64,
    soil_moisture: f64,
    temperature: f64,
    cloud_cover: f64,
}

#[async_trait]
impl TelemetryProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch(&self, location: &Location, date: NaiveDate) -> AppResult<TelemetrySnapshot> {
        Ok(TelemetrySnapshot::new(TelemetryReading {
            location_id: location.id.clone(),
            date,
            ndvi: self.ndvi,
            soil_moisture: self.soil_moisture,
            temperature: self.temperature,
            precipitation: 0.0,
            cloud_cover: self.cloud_cover,
            humidity: 50.0,
            confidence: 0.9,
            source: "fixed".to_string(),
            generated_at: Utc::now(),
        })?)
    }
}

struct DownProvider;

#[async_trait]
impl TelemetryProvider for DownProvider {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch(&self, _location: &Location, _date: NaiveDate) -> AppResult<TelemetrySnapshot> {
        Err(AppError::TelemetryUnavailable("satellite feed offline".to_string()))
    }
}

/// Generator that answers with fixed prose after a delay
struct ScriptedGenerator {
    text: &'static str,
    delay: Duration,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &GenerationPrompt) -> AppResult<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.to_string())
    }
}

fn healthy_field() -> Arc<dyn TelemetryProvider> {
    Arc::new(FixedProvider {
        ndvi: 0.75,
        soil_moisture: 65.0,
        temperature: 20.0,
        cloud_cover: 20.0,
    })
}

fn stressed_field() -> Arc<dyn TelemetryProvider> {
    Arc::new(FixedProvider {
        ndvi: 0.15,
        soil_moisture: 12.0,
        temperature: 40.0,
        cloud_cover: 10.0,
    })
}

fn service(
    config: &Config,
    provider: Arc<dyn TelemetryProvider>,
    generator: Option<Arc<dyn TextGenerator>>,
) -> AdvisoryService {
    AdvisoryService::new(
        config,
        provider,
        generator,
        Arc::new(LocationRegistry::india_default()),
        Arc::new(CalibrationTable::india_default().unwrap()),
    )
}

fn request(text: &str) -> AdvisoryRequest {
    AdvisoryRequest {
        query_text: text.to_string(),
        language: None,
        location: None,
        user_id: Some("farmer-17".to_string()),
        context: AdvisoryContext {
            crop: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 15),
        },
    }
}

// ============================================================================
// Pipeline Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_healthy_irrigation_query() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, healthy_field(), None);

        let response = advisory
            .handle(request("When should I irrigate my wheat field?"))
            .await
            .unwrap();

        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.routing_analysis.agent, Domain::Irrigation);
        assert_eq!(response.routing_analysis.language_detected, Language::English);

        let satellite = response.satellite_data.as_ref().unwrap();
        assert_eq!(satellite.location_id, "ludhiana");
        assert!(satellite.environmental_score >= 80.0);
        assert!(satellite.stress_factors.is_empty());

        let metrics = &response.technical_metrics;
        assert!(metrics.satellite_data_integrated);
        assert_eq!(metrics.risk_assessment, "LOW");
        assert_eq!(metrics.agent, "irrigation_specialist");
        assert_eq!(metrics.text_source, TextSource::Templated);
        assert!((metrics.confidence_level - 0.64).abs() < 1e-9);
        assert!(!response.response_text.is_empty());
    }

    #[tokio::test]
    async fn test_stressed_field_market_query() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, stressed_field(), None);

        let response = advisory
            .handle(request("Should I sell my wheat now or wait for a better price?"))
            .await
            .unwrap();

        assert_eq!(response.routing_analysis.agent, Domain::MarketTiming);
        assert_eq!(response.technical_metrics.risk_assessment, "VERY_HIGH");

        let market = response.market.as_ref().unwrap();
        assert_eq!(market.crop, CropType::Wheat);
        assert_eq!(market.price_adjustment, 0.3);
        assert_eq!(market.outlook, MarketOutlook::Rising);
        assert_eq!(market.adjusted_price_per_quintal, Some(Decimal::new(295750, 2)));
        assert!(!market.forecast_degraded);
    }

    #[tokio::test]
    async fn test_forecast_failure_is_flagged_not_fatal() {
        let config = Config::defaults().unwrap();
        let calibration = CalibrationTable::new(vec![CropCalibration::new(
            CropType::Wheat,
            3.5,
            (0.6, 1.0),
            (15.0, 25.0),
            Decimal::from(2275),
        )
        .unwrap()]);
        let advisory = AdvisoryService::new(
            &config,
            healthy_field(),
            None,
            Arc::new(LocationRegistry::india_default()),
            Arc::new(calibration),
        );

        let response = advisory
            .handle(request("Should I sell my wheat now or wait for a better price?"))
            .await
            .unwrap();

        assert_eq!(response.status, ResponseStatus::Success);
        assert!(response.technical_metrics.satellite_data_integrated);

        let market = response.market.as_ref().unwrap();
        assert!(market.forecast_degraded);
        assert_eq!(market.crop, CropType::Wheat);
        assert_eq!(market.expected_yield_t_ha, 3.5);
        assert_eq!(market.yield_ratio, 1.0);
        assert_eq!(market.outlook, MarketOutlook::Stable);
    }

    #[tokio::test]
    async fn test_telemetry_outage_degrades_gracefully() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, Arc::new(DownProvider), None);

        let response = advisory
            .handle(request("When should I irrigate my wheat field?"))
            .await
            .unwrap();

        assert_eq!(response.status, ResponseStatus::Success);
        assert!(response.satellite_data.is_none());
        assert!(response.market.is_none());
        assert!(!response.technical_metrics.satellite_data_integrated);
        assert_eq!(response.technical_metrics.risk_assessment, "UNKNOWN");
        assert_eq!(
            response.technical_metrics.confidence_level,
            response.routing_analysis.confidence
        );
    }

    #[tokio::test]
    async fn test_ambiguous_query_asks_for_clarification() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, healthy_field(), None);

        let response = advisory.handle(request("water and loan")).await.unwrap();

        assert_eq!(response.status, ResponseStatus::ClarificationNeeded);
        assert_eq!(response.routing_analysis.agent, Domain::General);
        let clarification = response.clarification.as_ref().unwrap();
        assert!(clarification.candidates.contains(&Domain::Irrigation));
        assert!(response.response_text.starts_with(&clarification.question));
    }

    #[tokio::test]
    async fn test_hindi_query_gets_hindi_template() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, healthy_field(), None);

        let response = advisory
            .handle(request("गेहूं में सिंचाई कब करें?"))
            .await
            .unwrap();

        assert_eq!(response.routing_analysis.agent, Domain::Irrigation);
        assert_eq!(response.routing_analysis.language_detected, Language::Hindi);
        assert!(response.response_text.contains("खेत की स्थिति"));
    }

    #[tokio::test]
    async fn test_generated_text_is_used_when_available() {
        let config = Config::defaults().unwrap();
        let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator {
            text: "Irrigate early tomorrow morning.",
            delay: Duration::from_millis(0),
        });
        let advisory = service(&config, healthy_field(), Some(generator));

        let response = advisory
            .handle(request("When should I irrigate my wheat field?"))
            .await
            .unwrap();

        assert_eq!(response.response_text, "Irrigate early tomorrow morning.");
        assert_eq!(response.technical_metrics.text_source, TextSource::Generated);
    }

    #[tokio::test]
    async fn test_generation_timeout_falls_back_to_template() {
        let mut config = Config::defaults().unwrap();
        config.generation.timeout_ms = 20;
        let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator {
            text: "too late",
            delay: Duration::from_millis(500),
        });
        let advisory = service(&config, healthy_field(), Some(generator));

        let response = advisory
            .handle(request("When should I irrigate my wheat field?"))
            .await
            .unwrap();

        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.technical_metrics.text_source, TextSource::Templated);
        assert_ne!(response.response_text, "too late");
    }

    #[tokio::test]
    async fn test_request_hints_carry_into_query() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, healthy_field(), None);

        let mut req = request("When should I irrigate my wheat field?");
        req.language = Some(Language::Hindi);
        req.location = Some(LocationInput::Named("jaipur".to_string()));

        let response = advisory.handle(req).await.unwrap();

        assert_eq!(response.routing_analysis.language_detected, Language::English);
        assert_eq!(response.satellite_data.as_ref().unwrap().location_id, "jaipur");
        assert!(response.response_text.contains("खेत की स्थिति"));
    }

    #[tokio::test]
    async fn test_far_coordinates_are_rejected() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, healthy_field(), None);

        let mut req = request("When should I irrigate?");
        req.location = Some(LocationInput::Coordinates(GpsCoordinates::new(51.5074, -0.1278)));

        let result = advisory.handle(req).await;
        assert!(matches!(result, Err(AppError::InvalidLocation { .. })));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, healthy_field(), None);

        let result = advisory.handle(request("   ")).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_context_crop_overrides_detected_crop() {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, stressed_field(), None);

        let mut req = request("Should I sell my wheat now?");
        req.context.crop = Some("cotton".to_string());

        let response = advisory.handle(req).await.unwrap();
        assert_eq!(response.market.unwrap().crop, CropType::Cotton);
    }
}

// ============================================================================
// HTTP Tests
// ============================================================================

mod http_tests {
    use super::*;

    fn app() -> axum::Router {
        let config = Config::defaults().unwrap();
        let advisory = service(&config, Arc::new(SimulatedTelemetryProvider), None);
        create_app(AppState::new(config, advisory))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_query_endpoint_answers() {
        let response = app()
            .oneshot(post(
                "/api/v1/advisory/query",
                serde_json::json!({
                    "query_text": "What fertilizer should I use for cotton?",
                    "location": "Jaipur",
                    "context": { "date": "2024-06-01" }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["routing_analysis"]["agent"], "input_materials");
        assert_eq!(body["satellite_data"]["location_id"], "jaipur");
        assert_eq!(body["technical_metrics"]["satellite_data_integrated"], true);
    }

    #[tokio::test]
    async fn test_far_location_is_unprocessable() {
        let response = app()
            .oneshot(post(
                "/api/v1/advisory/query",
                serde_json::json!({
                    "query_text": "When should I irrigate?",
                    "location": { "latitude": 51.5074, "longitude": -0.1278 }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["code"], "INVALID_LOCATION");
        assert_eq!(body["satellite_data_integrated"], false);
    }

    #[tokio::test]
    async fn test_unknown_location_is_not_found() {
        let response = app()
            .oneshot(post(
                "/api/v1/advisory/query",
                serde_json::json!({ "query_text": "When should I irrigate?", "location": "Atlantis" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_telemetry_endpoint() {
        let response = app()
            .oneshot(get("/api/v1/telemetry?location=ludhiana&date=2024-03-15&crop=wheat"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["location"]["id"], "ludhiana");
        assert_eq!(body["snapshot"]["date"], "2024-03-15");
        assert!(body["environmental_score"].as_f64().unwrap() <= 100.0);
    }

    #[tokio::test]
    async fn test_health_and_capabilities() {
        let health = app().oneshot(get("/health")).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        let body = json_body(health).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["text_generation"], "templated");

        let capabilities = app().oneshot(get("/api/v1/capabilities")).await.unwrap();
        let body = json_body(capabilities).await;
        assert_eq!(body["domains"].as_array().unwrap().len(), 8);
        assert_eq!(body["monitoring_points"], 10);
    }
}
