//! Advisory pipeline
//!
//! classification ‖ telemetry → enrichment → fusion → synthesis
//!
//! Classification and telemetry acquisition run concurrently. Enrichment
//! waits on telemetry, fusion joins classification with enrichment, and
//! synthesis is the terminal step. Only an ambiguous query or an invalid
//! location produce a non-success status; every other failure degrades.

use chrono::{NaiveDate, Utc};
use shared::{
    validate_query_text, AdvisoryRequest, AdvisoryResponse, CalibrationTable, LocationRegistry,
    Query,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::{GeminiClient, TextGenerator};
use crate::services::classifier::IntentClassifier;
use crate::services::enrichment::EnrichmentService;
use crate::services::fusion::FusionService;
use crate::services::synthesis::{ResponseContext, ResponseSynthesizer};
use crate::services::telemetry::{SimulatedTelemetryProvider, TelemetryProvider, TelemetryService};

/// The full query pipeline with its injected collaborators
#[derive(Clone)]
pub struct AdvisoryService {
    classifier: IntentClassifier,
    telemetry: TelemetryService,
    enrichment: EnrichmentService,
    fusion: FusionService,
    synthesizer: ResponseSynthesizer,
}

impl AdvisoryService {
    /// Build the pipeline from explicit collaborators
    pub fn new(
        config: &Config,
        provider: Arc<dyn TelemetryProvider>,
        generator: Option<Arc<dyn TextGenerator>>,
        registry: Arc<LocationRegistry>,
        calibration: Arc<CalibrationTable>,
    ) -> Self {
        let timeout = Duration::from_millis(config.generation.timeout_ms);
        Self {
            classifier: IntentClassifier::new(config.classifier.clone(), generator.clone(), timeout),
            telemetry: TelemetryService::new(provider, registry, config.telemetry.clone()),
            enrichment: EnrichmentService::new(Arc::clone(&calibration)),
            fusion: FusionService::new(config.fusion.clone(), Arc::clone(&calibration)),
            synthesizer: ResponseSynthesizer::new(generator, timeout, calibration),
        }
    }

    /// Production wiring: simulated telemetry and Gemini when a key is set
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let registry = Arc::new(LocationRegistry::india_default());
        let calibration = Arc::new(CalibrationTable::india_default()?);

        let generator: Option<Arc<dyn TextGenerator>> = if config.generation.is_enabled() {
            Some(Arc::new(GeminiClient::new(&config.generation)?))
        } else {
            tracing::warn!("No generation API key configured, responses will be templated");
            None
        };

        Ok(Self::new(
            config,
            Arc::new(SimulatedTelemetryProvider),
            generator,
            registry,
            calibration,
        ))
    }

    pub fn telemetry(&self) -> &TelemetryService {
        &self.telemetry
    }

    pub fn enrichment(&self) -> &EnrichmentService {
        &self.enrichment
    }

    /// Run one query through the pipeline
    pub async fn handle(&self, request: AdvisoryRequest) -> AppResult<AdvisoryResponse> {
        let started = Instant::now();
        validate_request(&request)?;

        let query = Query::new(request.query_text.trim())
            .with_language(request.language)
            .with_location(request.location.clone())
            .with_user(request.user_id.clone());

        let date: NaiveDate = request
            .context
            .date
            .unwrap_or_else(|| Utc::now().date_naive());

        let location = self.telemetry.resolve(query.location.as_ref(), Some(&query.text))?;

        let (classification, telemetry) = tokio::join!(
            self.classifier.classify(&query.text),
            self.telemetry.snapshot(&location, date)
        );

        let snapshot = match telemetry {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(
                    location = %location.location.id,
                    "Continuing without telemetry: {}",
                    err
                );
                None
            }
        };

        let crop = request.context.crop().or(classification.crop);
        let enrichment = snapshot.as_deref().map(|s| self.enrichment.enrich(s, crop));

        let recommendation = match (&snapshot, &enrichment) {
            (Some(snapshot), Some(enrichment)) => {
                self.fusion
                    .fuse(&classification, Arc::clone(snapshot), enrichment)
            }
            _ => self.fusion.fuse_without_telemetry(&classification),
        };

        let language = query.language.unwrap_or(classification.language);
        let response = self
            .synthesizer
            .respond(ResponseContext {
                query: &query,
                classification: &classification,
                language,
                location: &location,
                snapshot: snapshot.as_deref(),
                enrichment: enrichment.as_ref(),
                recommendation: &recommendation,
                started,
            })
            .await;

        tracing::info!(
            query_id = %response.query_id,
            agent = %classification.domain,
            status = ?response.status,
            confidence = response.technical_metrics.confidence_level,
            telemetry = response.technical_metrics.satellite_data_integrated,
            elapsed_ms = response.technical_metrics.processing_time_ms,
            "Advisory query answered"
        );
        Ok(response)
    }
}

fn validate_request(request: &AdvisoryRequest) -> AppResult<()> {
    validate_query_text(&request.query_text).map_err(|msg| {
        AppError::validation("query_text", msg, "सवाल खाली या बहुत लंबा नहीं होना चाहिए")
    })?;
    request.validate().map_err(|e| {
        let field = e
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "request".to_string());
        AppError::Validation {
            field,
            message: e.to_string(),
            message_hi: "अनुरोध में दी गई जानकारी मान्य नहीं है".to_string(),
        }
    })?;
    Ok(())
}
