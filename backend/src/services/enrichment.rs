//! Environmental enrichment and risk engine
//!
//! Turns a telemetry snapshot into an environmental score (0-100), a risk
//! assessment, and an optional crop yield forecast.

use serde::Serialize;
use shared::{
    Band, CalibrationTable, CropCalibration, CropType, RiskAssessment, StressFactor,
    TelemetrySnapshot, YieldForecast, YieldMultipliers, DEFAULT_TEMPERATURE_BAND,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};

/// NDVI below this counts as a stress factor
pub const LOW_VEGETATION_NDVI: f64 = 0.3;
/// Soil moisture (%) below this counts as a stress factor
pub const DROUGHT_SOIL_MOISTURE: f64 = 20.0;

// ============================================================================
// Environmental Score
// ============================================================================

/// Score components, each in [0, 100]
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScoreBreakdown {
    pub vegetation: f64,
    pub moisture: f64,
    pub temperature: f64,
    pub sky: f64,
}

impl ScoreBreakdown {
    /// Weighted total: 40% vegetation, 30% moisture, 20% temperature, 10% sky
    pub fn total(&self) -> f64 {
        (0.4 * self.vegetation + 0.3 * self.moisture + 0.2 * self.temperature + 0.1 * self.sky)
            .clamp(0.0, 100.0)
    }
}

/// Score components for the given readings
pub fn score_breakdown(
    ndvi: f64,
    soil_moisture: f64,
    temperature: f64,
    cloud_cover: f64,
    band: Band,
) -> ScoreBreakdown {
    let vegetation = ((ndvi.clamp(-1.0, 1.0) + 1.0) / 2.0) * 100.0;
    let moisture = (soil_moisture * 1.5).clamp(0.0, 100.0);
    let temperature = if band.contains(temperature) {
        100.0
    } else if temperature < band.min {
        (100.0 - 3.0 * (band.min - temperature)).max(0.0)
    } else {
        (100.0 - 2.0 * (temperature - band.max)).max(0.0)
    };
    let sky = (100.0 - cloud_cover).clamp(0.0, 100.0);

    ScoreBreakdown {
        vegetation,
        moisture,
        temperature,
        sky,
    }
}

pub fn environmental_score(snapshot: &TelemetrySnapshot, band: Band) -> f64 {
    score_breakdown(
        snapshot.ndvi(),
        snapshot.soil_moisture(),
        snapshot.temperature(),
        snapshot.cloud_cover(),
        band,
    )
    .total()
}

// ============================================================================
// Risk
// ============================================================================

/// Stress factors present in the snapshot, in a fixed order
pub fn stress_factors(snapshot: &TelemetrySnapshot, band: Band) -> Vec<StressFactor> {
    let mut factors = Vec::new();
    if snapshot.ndvi() < LOW_VEGETATION_NDVI {
        factors.push(StressFactor::LowVegetation);
    }
    if snapshot.soil_moisture() < DROUGHT_SOIL_MOISTURE {
        factors.push(StressFactor::SevereDrought);
    }
    if snapshot.temperature() > band.max {
        factors.push(StressFactor::HeatStress);
    } else if snapshot.temperature() < band.min {
        factors.push(StressFactor::ColdStress);
    }
    factors
}

pub fn assess_risk(snapshot: &TelemetrySnapshot, band: Band) -> RiskAssessment {
    RiskAssessment::from_factors(stress_factors(snapshot, band))
}

// ============================================================================
// Yield Multipliers
// ============================================================================

/// f(NDVI): 0.7→1.0 below the band, 1.0→1.3 across it, 1.3→0.8 above it
pub fn ndvi_multiplier(ndvi: f64, band: Band) -> f64 {
    if band.contains(ndvi) {
        1.0 + (ndvi - band.min) / band.width() * 0.3
    } else if ndvi < band.min {
        0.7 + (ndvi + 1.0) / (band.min + 1.0) * 0.3
    } else {
        let excess = (ndvi - band.max) / (1.0 - band.max);
        1.3 - 0.5 * excess.clamp(0.0, 1.0)
    }
}

/// g(soil moisture %)
pub fn moisture_multiplier(soil_moisture: f64) -> f64 {
    if soil_moisture > 60.0 {
        1.0
    } else if soil_moisture > 30.0 {
        0.8 + (soil_moisture - 30.0) / 30.0 * 0.2
    } else {
        0.5 + soil_moisture.max(0.0) / 30.0 * 0.3
    }
}

/// h(temperature °C)
pub fn temperature_multiplier(temperature: f64, band: Band) -> f64 {
    if band.contains(temperature) {
        1.0
    } else if temperature < band.min {
        (1.0 - (band.min - temperature) / 20.0 * 0.4).max(0.6)
    } else {
        (1.0 - (temperature - band.max) / 20.0 * 0.5).max(0.5)
    }
}

/// Yield forecast from calibration and readings
///
/// Fails with `InternalComputation` on non-finite inputs or multipliers.
pub fn forecast_yield(
    calibration: &CropCalibration,
    ndvi: f64,
    soil_moisture: f64,
    temperature: f64,
) -> AppResult<YieldForecast> {
    for (field, value) in [
        ("ndvi", ndvi),
        ("soil_moisture", soil_moisture),
        ("temperature", temperature),
        ("base_yield", calibration.base_yield_t_ha),
    ] {
        if !value.is_finite() {
            return Err(AppError::InternalComputation(format!(
                "{} is not finite for {}",
                field, calibration.crop
            )));
        }
    }
    if calibration.ndvi_band.max >= 1.0 {
        return Err(AppError::InternalComputation(format!(
            "NDVI band for {} reaches 1.0",
            calibration.crop
        )));
    }

    let multipliers = YieldMultipliers {
        ndvi: ndvi_multiplier(ndvi, calibration.ndvi_band),
        soil_moisture: moisture_multiplier(soil_moisture),
        temperature: temperature_multiplier(temperature, calibration.temperature_band),
    };
    if !multipliers.product().is_finite() {
        return Err(AppError::InternalComputation(format!(
            "yield multipliers diverged for {}",
            calibration.crop
        )));
    }

    Ok(YieldForecast::new(
        calibration.crop,
        calibration.base_yield_t_ha,
        multipliers,
    ))
}

// ============================================================================
// Enrichment Service
// ============================================================================

/// Output of enrichment for one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub environmental_score: f64,
    pub risk: RiskAssessment,
    pub forecast: Option<YieldForecast>,
    /// Set when the yield model failed and a neutral forecast was used
    pub forecast_degraded: bool,
}

/// Stateless scorer over the immutable calibration table
#[derive(Clone)]
pub struct EnrichmentService {
    calibration: Arc<CalibrationTable>,
}

impl EnrichmentService {
    pub fn new(calibration: Arc<CalibrationTable>) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    /// Optimal temperature band for the crop, or the default band
    pub fn temperature_band(&self, crop: Option<CropType>) -> Band {
        crop.and_then(|c| self.calibration.get(c))
            .map(|c| c.temperature_band)
            .unwrap_or(DEFAULT_TEMPERATURE_BAND)
    }

    pub fn enrich(&self, snapshot: &TelemetrySnapshot, crop: Option<CropType>) -> Enrichment {
        let band = self.temperature_band(crop);
        let environmental_score = environmental_score(snapshot, band);
        let risk = assess_risk(snapshot, band);

        let calibration = crop.and_then(|c| self.calibration.get(c));
        let (forecast, forecast_degraded) = match calibration {
            None => (None, false),
            Some(calibration) => match forecast_yield(
                calibration,
                snapshot.ndvi(),
                snapshot.soil_moisture(),
                snapshot.temperature(),
            ) {
                Ok(forecast) => (Some(forecast), false),
                Err(err) => {
                    tracing::warn!("Yield forecast failed, using neutral forecast: {}", err);
                    (
                        Some(YieldForecast::neutral(
                            calibration.crop,
                            calibration.base_yield_t_ha,
                        )),
                        true,
                    )
                }
            },
        };

        tracing::debug!(
            location = snapshot.location_id(),
            environmental_score,
            risk = risk.risk_level.as_str(),
            "Snapshot enriched"
        );

        Enrichment {
            environmental_score,
            risk,
            forecast,
            forecast_degraded,
        }
    }
}
