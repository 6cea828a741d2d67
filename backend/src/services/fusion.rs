//! Confidence fusion and price adjustment

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use shared::{
    CalibrationTable, DomainClassification, MarketOutlook, PriceAdjustment, Recommendation,
    RiskLevel, TelemetrySnapshot, YieldForecast,
};
use std::sync::Arc;

use crate::config::FusionConfig;
use crate::services::enrichment::Enrichment;

/// NDVI below this adds a supply-risk premium
pub const SUPPLY_RISK_NDVI: f64 = 0.4;

/// Classifier confidence plus a telemetry boost, capped at `ceiling`
pub fn fuse_confidence(base: f64, telemetry_confidence: Option<f64>, settings: &FusionConfig) -> f64 {
    let base = if base.is_finite() { base.clamp(0.0, 1.0) } else { 0.0 };
    let boost = telemetry_confidence
        .filter(|c| c.is_finite())
        .map(|c| settings.telemetry_boost * c.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    (base + boost).min(settings.confidence_ceiling)
}

/// Accumulate the price adjustment terms, then clamp
///
/// - shortfall: `+0.15 * (0.8 - r) / 0.8` for ratio `r < 0.8`, linear with no
///   saturation point, so the full +0.15 applies only at `r = 0`
/// - +0.20 at very high risk
/// - +0.10 when NDVI is below 0.4
/// - surplus: `-0.10 * min(1, (r - 1.2) / 0.8)` for `r > 1.2`, saturating
///   at -0.10 from `r = 2.0`
pub fn price_adjustment(yield_ratio: Option<f64>, risk_level: RiskLevel, ndvi: f64) -> PriceAdjustment {
    let mut raw = 0.0;

    if let Some(ratio) = yield_ratio.filter(|r| r.is_finite()) {
        if ratio < 0.8 {
            raw += 0.15 * ((0.8 - ratio) / 0.8).clamp(0.0, 1.0);
        } else if ratio > 1.2 {
            raw -= 0.10 * ((ratio - 1.2) / 0.8).min(1.0);
        }
    }
    if risk_level == RiskLevel::VeryHigh {
        raw += 0.20;
    }
    if ndvi < SUPPLY_RISK_NDVI {
        raw += 0.10;
    }

    PriceAdjustment::from_raw(raw)
}

/// Reference price scaled by (1 + adjustment), rounded to paise
pub fn adjusted_price(reference: Decimal, adjustment: &PriceAdjustment) -> Option<Decimal> {
    let factor = Decimal::from_f64(1.0 + adjustment.value())?;
    Some((reference * factor).round_dp(2))
}

/// Joins classification with enrichment
#[derive(Clone)]
pub struct FusionService {
    settings: FusionConfig,
    calibration: Arc<CalibrationTable>,
}

impl FusionService {
    pub fn new(settings: FusionConfig, calibration: Arc<CalibrationTable>) -> Self {
        Self {
            settings,
            calibration,
        }
    }

    pub fn settings(&self) -> &FusionConfig {
        &self.settings
    }

    /// Full fusion with telemetry
    pub fn fuse(
        &self,
        classification: &DomainClassification,
        snapshot: Arc<TelemetrySnapshot>,
        enrichment: &Enrichment,
    ) -> Recommendation {
        let fused_confidence = fuse_confidence(
            classification.confidence,
            Some(snapshot.confidence()),
            &self.settings,
        );

        let forecast: Option<YieldForecast> = enrichment.forecast.clone();
        let adjustment = price_adjustment(
            forecast.as_ref().map(YieldForecast::yield_ratio),
            enrichment.risk.risk_level,
            snapshot.ndvi(),
        );

        if adjustment.was_clamped() {
            tracing::debug!(
                raw = adjustment.raw(),
                clamped = adjustment.value(),
                "Price adjustment clamped"
            );
        }

        let adjusted_price_per_quintal = forecast
            .as_ref()
            .and_then(|f| self.calibration.get(f.crop()))
            .and_then(|c| adjusted_price(c.reference_price_per_quintal, &adjustment));

        Recommendation {
            domain: classification.domain,
            fused_confidence,
            price_adjustment: adjustment,
            telemetry_integrated: true,
            market_outlook: Some(MarketOutlook::from_adjustment(adjustment.value())),
            adjusted_price_per_quintal,
            snapshot: Some(snapshot),
            forecast,
        }
    }

    /// Degraded fusion: no boost and no adjustment terms
    pub fn fuse_without_telemetry(&self, classification: &DomainClassification) -> Recommendation {
        Recommendation {
            domain: classification.domain,
            fused_confidence: fuse_confidence(classification.confidence, None, &self.settings),
            price_adjustment: PriceAdjustment::none(),
            telemetry_integrated: false,
            market_outlook: None,
            adjusted_price_per_quintal: None,
            snapshot: None,
            forecast: None,
        }
    }
}
