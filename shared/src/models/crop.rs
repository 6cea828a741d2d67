//! Crop calibration tables
//!
//! Base yields are in tonnes per hectare. Reference prices are in rupees per
//! quintal and serve as the anchor for market price adjustments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_in_range, ModelError};

/// Crops with calibrated yield models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CropType {
    Wheat,
    Rice,
    Cotton,
    Sugarcane,
    Soybean,
    Mustard,
    Maize,
    Potato,
    Onion,
    Tomato,
}

impl CropType {
    pub const ALL: [CropType; 10] = [
        CropType::Wheat,
        CropType::Rice,
        CropType::Cotton,
        CropType::Sugarcane,
        CropType::Soybean,
        CropType::Mustard,
        CropType::Maize,
        CropType::Potato,
        CropType::Onion,
        CropType::Tomato,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Wheat => "wheat",
            CropType::Rice => "rice",
            CropType::Cotton => "cotton",
            CropType::Sugarcane => "sugarcane",
            CropType::Soybean => "soybean",
            CropType::Mustard => "mustard",
            CropType::Maize => "maize",
            CropType::Potato => "potato",
            CropType::Onion => "onion",
            CropType::Tomato => "tomato",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        CropType::ALL
            .into_iter()
            .find(|crop| crop.as_str() == name || crop.keywords().contains(&name.as_str()))
    }

    /// Names a farmer may use: English, romanized Hindi, Devanagari
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            CropType::Wheat => &["wheat", "gehun", "gehu", "गेहूं", "गेहूँ"],
            CropType::Rice => &["rice", "paddy", "dhan", "chawal", "धान", "चावल"],
            CropType::Cotton => &["cotton", "kapas", "कपास"],
            CropType::Sugarcane => &["sugarcane", "ganna", "गन्ना"],
            CropType::Soybean => &["soybean", "soya", "soyabean", "सोयाबीन"],
            CropType::Mustard => &["mustard", "sarson", "सरसों"],
            CropType::Maize => &["maize", "corn", "makka", "मक्का"],
            CropType::Potato => &["potato", "aloo", "आलू"],
            CropType::Onion => &["onion", "pyaz", "pyaaz", "प्याज"],
            CropType::Tomato => &["tomato", "tamatar", "टमाटर"],
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed interval used for optimal NDVI and temperature ranges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub fn new(min: f64, max: f64) -> Result<Self, ModelError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ModelError::InvalidBand { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Temperature band applied when no crop is known
pub const DEFAULT_TEMPERATURE_BAND: Band = Band {
    min: 20.0,
    max: 30.0,
};

/// Calibration constants for one crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropCalibration {
    pub crop: CropType,
    pub base_yield_t_ha: f64,
    pub ndvi_band: Band,
    pub temperature_band: Band,
    pub reference_price_per_quintal: Decimal,
}

impl CropCalibration {
    pub fn new(
        crop: CropType,
        base_yield_t_ha: f64,
        ndvi_band: (f64, f64),
        temperature_band: (f64, f64),
        reference_price_per_quintal: Decimal,
    ) -> Result<Self, ModelError> {
        ensure_in_range("base_yield", base_yield_t_ha, 0.0, f64::MAX)?;
        let ndvi_band = Band::new(ndvi_band.0, ndvi_band.1)?;
        ensure_in_range("ndvi_band.min", ndvi_band.min, -1.0, 1.0)?;
        ensure_in_range("ndvi_band.max", ndvi_band.max, -1.0, 1.0)?;
        Ok(Self {
            crop,
            base_yield_t_ha,
            ndvi_band,
            temperature_band: Band::new(temperature_band.0, temperature_band.1)?,
            reference_price_per_quintal,
        })
    }
}

/// Immutable per-crop calibration, built once at startup
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    entries: Vec<CropCalibration>,
}

impl CalibrationTable {
    pub fn new(entries: Vec<CropCalibration>) -> Self {
        Self { entries }
    }

    /// Calibration for the crops grown across the monitored Indian regions
    pub fn india_default() -> Result<Self, ModelError> {
        let rows = [
            (CropType::Wheat, 3.5, (0.6, 0.8), (15.0, 25.0), 2275),
            (CropType::Rice, 4.2, (0.7, 0.9), (22.0, 32.0), 2183),
            (CropType::Cotton, 1.8, (0.5, 0.75), (21.0, 32.0), 6620),
            (CropType::Sugarcane, 75.0, (0.8, 0.95), (20.0, 35.0), 315),
            (CropType::Soybean, 2.8, (0.6, 0.8), (20.0, 30.0), 4600),
            (CropType::Mustard, 1.5, (0.5, 0.7), (10.0, 25.0), 5650),
            (CropType::Maize, 3.8, (0.6, 0.8), (18.0, 30.0), 2090),
            (CropType::Potato, 22.0, (0.5, 0.75), (15.0, 22.0), 1200),
            (CropType::Onion, 18.0, (0.4, 0.65), (13.0, 28.0), 1800),
            (CropType::Tomato, 25.0, (0.5, 0.7), (18.0, 29.0), 1500),
        ];

        let entries = rows
            .into_iter()
            .map(|(crop, base, ndvi, temp, price)| {
                CropCalibration::new(crop, base, ndvi, temp, Decimal::from(price))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    pub fn get(&self, crop: CropType) -> Option<&CropCalibration> {
        self.entries.iter().find(|entry| entry.crop == crop)
    }

    pub fn all(&self) -> &[CropCalibration] {
        &self.entries
    }

    pub fn crops(&self) -> Vec<CropType> {
        self.entries.iter().map(|entry| entry.crop).collect()
    }
}
