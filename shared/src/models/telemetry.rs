//! Environmental telemetry snapshots

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_in_range, ensure_non_negative, ModelError};

/// Unvalidated field set used to build a [`TelemetrySnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub location_id: String,
    pub date: NaiveDate,
    pub ndvi: f64,
    pub soil_moisture: f64,
    pub temperature: f64,
    pub precipitation: f64,
    pub cloud_cover: f64,
    pub humidity: f64,
    pub confidence: f64,
    pub source: String,
    pub generated_at: DateTime<Utc>,
}

/// Immutable environmental reading for a (location, date) key
///
/// Bounds are checked once in [`TelemetrySnapshot::new`]; there are no
/// setters, so every instance in circulation satisfies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TelemetryReading")]
pub struct TelemetrySnapshot {
    location_id: String,
    date: NaiveDate,
    ndvi: f64,
    soil_moisture: f64,
    temperature: f64,
    precipitation: f64,
    cloud_cover: f64,
    humidity: f64,
    confidence: f64,
    source: String,
    generated_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    pub fn new(reading: TelemetryReading) -> Result<Self, ModelError> {
        Ok(Self {
            ndvi: ensure_in_range("ndvi", reading.ndvi, -1.0, 1.0)?,
            soil_moisture: ensure_in_range("soil_moisture", reading.soil_moisture, 0.0, 100.0)?,
            temperature: ensure_in_range("temperature", reading.temperature, -60.0, 60.0)?,
            precipitation: ensure_non_negative("precipitation", reading.precipitation)?,
            cloud_cover: ensure_in_range("cloud_cover", reading.cloud_cover, 0.0, 100.0)?,
            humidity: ensure_in_range("humidity", reading.humidity, 0.0, 100.0)?,
            confidence: ensure_in_range("confidence", reading.confidence, 0.0, 1.0)?,
            location_id: reading.location_id,
            date: reading.date,
            source: reading.source,
            generated_at: reading.generated_at,
        })
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn ndvi(&self) -> f64 {
        self.ndvi
    }

    /// Volumetric soil moisture, percent
    pub fn soil_moisture(&self) -> f64 {
        self.soil_moisture
    }

    /// Air temperature, °C
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Daily precipitation, mm
    pub fn precipitation(&self) -> f64 {
        self.precipitation
    }

    /// Cloud cover, percent
    pub fn cloud_cover(&self) -> f64 {
        self.cloud_cover
    }

    /// Relative humidity, percent
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn vegetation_health(&self) -> VegetationHealth {
        VegetationHealth::assess(self.ndvi, self.soil_moisture)
    }

    /// Copy with confidence reduced by `penalty`, floored at zero
    pub fn with_confidence_penalty(&self, penalty: f64) -> Self {
        let penalty = if penalty.is_finite() { penalty.max(0.0) } else { 0.0 };
        Self {
            confidence: (self.confidence - penalty).clamp(0.0, 1.0),
            ..self.clone()
        }
    }
}

impl TryFrom<TelemetryReading> for TelemetrySnapshot {
    type Error = ModelError;

    fn try_from(reading: TelemetryReading) -> Result<Self, Self::Error> {
        TelemetrySnapshot::new(reading)
    }
}

/// Qualitative vegetation condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VegetationHealth {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl VegetationHealth {
    pub fn assess(ndvi: f64, soil_moisture: f64) -> Self {
        if ndvi > 0.7 && soil_moisture > 40.0 {
            VegetationHealth::Excellent
        } else if ndvi > 0.5 && soil_moisture > 25.0 {
            VegetationHealth::Good
        } else if ndvi > 0.3 && soil_moisture > 15.0 {
            VegetationHealth::Fair
        } else if ndvi > 0.1 {
            VegetationHealth::Poor
        } else {
            VegetationHealth::Critical
        }
    }

    pub fn label_hi(&self) -> &'static str {
        match self {
            VegetationHealth::Excellent => "उत्कृष्ट",
            VegetationHealth::Good => "अच्छी",
            VegetationHealth::Fair => "सामान्य",
            VegetationHealth::Poor => "कमज़ोर",
            VegetationHealth::Critical => "गंभीर",
        }
    }
}
