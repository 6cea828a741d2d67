//! Response synthesis
//!
//! Collects routing, telemetry, enrichment and fusion outputs into one
//! structured response. Prose comes from the text generator under a timeout;
//! on timeout or failure a templated answer is used instead.

use chrono::Utc;
use shared::{
    AdvisoryResponse, CalibrationTable, Clarification, Domain, DomainClassification, Language,
    MarketInsight, MarketOutlook, Query, Recommendation, ResponseStatus, RoutingAnalysis,
    SatelliteData, TechnicalMetrics, TelemetrySnapshot, TextSource,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};
use crate::external::{GenerationPrompt, TextGenerator};
use crate::services::enrichment::Enrichment;
use crate::services::specialists::{specialist_for, AdvisoryFacts};
use crate::services::telemetry::ResolvedLocation;

/// Inputs gathered by the pipeline for one query
pub struct ResponseContext<'a> {
    pub query: &'a Query,
    pub classification: &'a DomainClassification,
    /// Language the answer should be written in
    pub language: Language,
    pub location: &'a ResolvedLocation,
    pub snapshot: Option<&'a TelemetrySnapshot>,
    pub enrichment: Option<&'a Enrichment>,
    pub recommendation: &'a Recommendation,
    pub started: Instant,
}

impl ResponseContext<'_> {
    fn facts<'b>(&'b self, calibration: &'b CalibrationTable) -> AdvisoryFacts<'b> {
        AdvisoryFacts {
            language: self.language,
            crop: self
                .recommendation
                .forecast
                .as_ref()
                .map(|f| f.crop())
                .or(self.classification.crop),
            location_name: Some(self.location.location.name.as_str()),
            snapshot: self.snapshot,
            environmental_score: self.enrichment.map(|e| e.environmental_score),
            risk: self.enrichment.map(|e| &e.risk),
            recommendation: self.recommendation,
            calibration,
        }
    }
}

pub fn language_name(language: Language) -> &'static str {
    match language {
        Language::English => "English",
        Language::Hindi => "Hindi (Devanagari script)",
        Language::Mixed => "Hinglish, the same Hindi-English mix the farmer used",
    }
}

/// Question asking the farmer to narrow down an ambiguous query
pub fn clarification_question(language: Language, candidates: &[Domain]) -> String {
    let names: Vec<&str> = candidates
        .iter()
        .filter(|d| **d != Domain::General)
        .map(|d| d.display_name(language))
        .collect();

    match (language.prefers_hindi(), names.is_empty()) {
        (false, true) => {
            "Could you tell us more about your crop and the problem you are facing?".to_string()
        }
        (false, false) => format!(
            "Could you tell us more? Is your question about {}?",
            names.join(" or ")
        ),
        (true, true) => "कृपया अपनी फसल और समस्या के बारे में थोड़ा और बताइए।".to_string(),
        (true, false) => format!(
            "कृपया थोड़ा और बताइए। क्या आपका सवाल {} के बारे में है?",
            names.join(" या ")
        ),
    }
}

/// Builds prompts, calls the generator, and assembles responses
#[derive(Clone)]
pub struct ResponseSynthesizer {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
    calibration: Arc<CalibrationTable>,
}

impl ResponseSynthesizer {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        timeout: Duration,
        calibration: Arc<CalibrationTable>,
    ) -> Self {
        Self {
            generator,
            timeout,
            calibration,
        }
    }

    /// Fact lines shared by every domain, then the specialist's own
    pub fn fact_lines(&self, ctx: &ResponseContext<'_>) -> Vec<String> {
        let facts = ctx.facts(&self.calibration);
        let mut lines = vec![format!("Location: {}", ctx.location.location.name)];

        match (ctx.snapshot, ctx.enrichment) {
            (Some(s), Some(e)) => {
                lines.push(format!(
                    "NDVI {:.2}, soil moisture {:.1}%, temperature {:.1}°C, humidity {:.0}%",
                    s.ndvi(),
                    s.soil_moisture(),
                    s.temperature(),
                    s.humidity()
                ));
                lines.push(format!(
                    "Environmental score {:.0}/100, risk {}",
                    e.environmental_score,
                    e.risk.risk_level.as_str()
                ));
                for factor in &e.risk.stress_factors {
                    lines.push(format!("Stress: {}", factor.description()));
                }
            }
            _ => lines.push("Live field telemetry is unavailable".to_string()),
        }
        if let Some(crop) = facts.crop {
            lines.push(format!("Crop: {}", crop));
        }

        lines.extend(specialist_for(ctx.classification.domain).key_facts(&facts));
        lines
    }

    pub fn prompt(&self, ctx: &ResponseContext<'_>) -> GenerationPrompt {
        let facts = self
            .fact_lines(ctx)
            .into_iter()
            .map(|l| format!("- {}", l))
            .collect::<Vec<_>>()
            .join("\n");

        GenerationPrompt {
            system: format!(
                "You are an agricultural advisor for Indian farmers specialising in {}. \
                 Respond in {}. Use only the facts provided, keep it practical and under 200 words.",
                ctx.classification.domain.display_name(Language::English),
                language_name(ctx.language)
            ),
            user: format!("Farmer's question: {}\n\nFacts:\n{}", ctx.query.text, facts),
            expect_json: false,
        }
    }

    /// Templated answer built from specialist advice
    pub fn templated_text(&self, ctx: &ResponseContext<'_>) -> String {
        let facts = ctx.facts(&self.calibration);
        let hindi = ctx.language.prefers_hindi();
        let domain = ctx.classification.domain;

        let mut lines = vec![format!(
            "{}: {}",
            domain.display_name(ctx.language),
            ctx.location.location.name
        )];

        match (ctx.snapshot, ctx.enrichment) {
            (Some(s), Some(e)) if ctx.language == Language::Hindi => lines.push(format!(
                "खेत की स्थिति: NDVI {:.2}, मिट्टी की नमी {:.0}%, तापमान {:.1}°C, जोखिम {}।",
                s.ndvi(),
                s.soil_moisture(),
                s.temperature(),
                e.risk.risk_level.label_hi()
            )),
            (Some(s), Some(e)) => lines.push(format!(
                "Field conditions: NDVI {:.2}, soil moisture {:.0}%, temperature {:.1}°C, risk {}.",
                s.ndvi(),
                s.soil_moisture(),
                s.temperature(),
                e.risk.risk_level.as_str()
            )),
            _ if hindi => lines.push(
                "अभी उपग्रह डेटा उपलब्ध नहीं है, इसलिए सलाह सामान्य है।".to_string(),
            ),
            _ => lines.push(
                "Live field data is unavailable right now, so this advice is general.".to_string(),
            ),
        }

        lines.extend(
            specialist_for(domain)
                .advice(&facts)
                .into_iter()
                .map(|l| format!("• {}", l)),
        );
        lines.join("\n")
    }

    async fn generate(&self, ctx: &ResponseContext<'_>) -> AppResult<String> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| AppError::GenerationFailed("no generator configured".to_string()))?;

        let prompt = self.prompt(ctx);
        tokio::time::timeout(self.timeout, generator.complete(&prompt))
            .await
            .map_err(|_| AppError::GenerationTimeout(self.timeout.as_millis() as u64))?
    }

    /// Response text and where it came from
    pub async fn compose_text(&self, ctx: &ResponseContext<'_>) -> (String, TextSource) {
        if ctx.classification.requires_clarification {
            let question =
                clarification_question(ctx.language, &ctx.classification.candidates);
            return (
                format!("{}\n{}", question, self.templated_text(ctx)),
                TextSource::Templated,
            );
        }

        match self.generate(ctx).await {
            Ok(text) => (text, TextSource::Generated),
            Err(AppError::GenerationTimeout(ms)) => {
                tracing::warn!("Generation timed out after {} ms, using templated response", ms);
                (self.templated_text(ctx), TextSource::Templated)
            }
            Err(err) => {
                if self.generator.is_some() {
                    tracing::warn!("Generation failed, using templated response: {}", err);
                }
                (self.templated_text(ctx), TextSource::Templated)
            }
        }
    }

    /// Assemble the final structured response
    pub async fn respond(&self, ctx: ResponseContext<'_>) -> AdvisoryResponse {
        let (response_text, text_source) = self.compose_text(&ctx).await;
        let classification = ctx.classification;
        let recommendation = ctx.recommendation;

        let satellite_data = match (ctx.snapshot, ctx.enrichment) {
            (Some(s), Some(e)) => Some(SatelliteData {
                location_id: s.location_id().to_string(),
                date: s.date(),
                ndvi: s.ndvi(),
                soil_moisture: s.soil_moisture(),
                temperature: s.temperature(),
                humidity: s.humidity(),
                precipitation: s.precipitation(),
                cloud_cover: s.cloud_cover(),
                data_confidence: s.confidence(),
                environmental_score: round2(e.environmental_score),
                risk_level: e.risk.risk_level,
                stress_factors: e.risk.stress_factors.clone(),
                vegetation_health: s.vegetation_health(),
            }),
            _ => None,
        };

        let market = recommendation.forecast.as_ref().map(|f| MarketInsight {
            crop: f.crop(),
            expected_yield_t_ha: round2(f.adjusted_yield()),
            yield_ratio: round2(f.yield_ratio()),
            price_adjustment: round2(recommendation.price_adjustment.value()),
            outlook: recommendation.market_outlook.unwrap_or(MarketOutlook::Stable),
            adjusted_price_per_quintal: recommendation.adjusted_price_per_quintal,
            forecast_degraded: ctx.enrichment.is_some_and(|e| e.forecast_degraded),
        });

        let (status, clarification) = if classification.requires_clarification {
            (
                ResponseStatus::ClarificationNeeded,
                Some(Clarification {
                    candidates: classification.candidates.clone(),
                    question: clarification_question(ctx.language, &classification.candidates),
                }),
            )
        } else {
            (ResponseStatus::Success, None)
        };

        AdvisoryResponse {
            status,
            query_id: ctx.query.id,
            original_query: ctx.query.text.clone(),
            routing_analysis: RoutingAnalysis {
                agent: classification.domain,
                confidence: classification.confidence,
                reasoning: classification.reasoning.clone(),
                language_detected: classification.language,
                source: classification.source,
            },
            satellite_data,
            market,
            clarification,
            response_text,
            technical_metrics: TechnicalMetrics {
                processing_time_ms: ctx.started.elapsed().as_millis() as u64,
                confidence_level: recommendation.fused_confidence,
                satellite_data_integrated: recommendation.telemetry_integrated,
                risk_assessment: ctx
                    .enrichment
                    .map(|e| e.risk.risk_level.as_upper().to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                agent: classification.domain.agent_name().to_string(),
                text_source,
            },
            timestamp: Utc::now(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
