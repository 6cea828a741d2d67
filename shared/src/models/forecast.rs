//! Yield forecast models

use serde::{Deserialize, Serialize};

use crate::models::CropType;

/// Piecewise multipliers applied to the base yield
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YieldMultipliers {
    pub ndvi: f64,
    pub soil_moisture: f64,
    pub temperature: f64,
}

impl YieldMultipliers {
    pub const NEUTRAL: YieldMultipliers = YieldMultipliers {
        ndvi: 1.0,
        soil_moisture: 1.0,
        temperature: 1.0,
    };

    pub fn product(&self) -> f64 {
        self.ndvi * self.soil_moisture * self.temperature
    }
}

/// Inputs a forecast is rebuilt from when deserialized
#[derive(Debug, Deserialize)]
struct ForecastInputs {
    crop: CropType,
    base_yield: f64,
    multipliers: YieldMultipliers,
}

impl From<ForecastInputs> for YieldForecast {
    fn from(inputs: ForecastInputs) -> Self {
        YieldForecast::new(inputs.crop, inputs.base_yield, inputs.multipliers)
    }
}

/// Yield estimate for one crop at one location
///
/// The adjusted yield is always derived in [`YieldForecast::new`]; a
/// serialized `adjusted_yield` is ignored on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "ForecastInputs")]
pub struct YieldForecast {
    crop: CropType,
    /// Tonnes per hectare
    base_yield: f64,
    /// Tonnes per hectare, never negative
    adjusted_yield: f64,
    multipliers: YieldMultipliers,
}

impl YieldForecast {
    pub fn new(crop: CropType, base_yield: f64, multipliers: YieldMultipliers) -> Self {
        let adjusted = base_yield * multipliers.product();
        Self {
            crop,
            base_yield,
            adjusted_yield: if adjusted.is_finite() { adjusted.max(0.0) } else { 0.0 },
            multipliers,
        }
    }

    /// Forecast equal to the base yield
    pub fn neutral(crop: CropType, base_yield: f64) -> Self {
        Self::new(crop, base_yield, YieldMultipliers::NEUTRAL)
    }

    pub fn crop(&self) -> CropType {
        self.crop
    }

    pub fn base_yield(&self) -> f64 {
        self.base_yield
    }

    pub fn adjusted_yield(&self) -> f64 {
        self.adjusted_yield
    }

    pub fn multipliers(&self) -> YieldMultipliers {
        self.multipliers
    }

    /// adjusted / base; 1.0 when the base is zero
    pub fn yield_ratio(&self) -> f64 {
        if self.base_yield > 0.0 {
            self.adjusted_yield / self.base_yield
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_and_floor() {
        let forecast = YieldForecast::new(
            CropType::Wheat,
            3.5,
            YieldMultipliers {
                ndvi: 1.2,
                soil_moisture: 1.0,
                temperature: 0.5,
            },
        );
        assert!((forecast.adjusted_yield() - 2.1).abs() < 1e-9);
        assert!((forecast.yield_ratio() - 0.6).abs() < 1e-9);

        let negative = YieldForecast::new(
            CropType::Rice,
            4.2,
            YieldMultipliers {
                ndvi: -1.0,
                soil_moisture: 1.0,
                temperature: 1.0,
            },
        );
        assert_eq!(negative.adjusted_yield(), 0.0);
    }

    #[test]
    fn test_neutral_forecast() {
        let forecast = YieldForecast::neutral(CropType::Cotton, 1.8);
        assert_eq!(forecast.adjusted_yield(), 1.8);
        assert_eq!(forecast.yield_ratio(), 1.0);
    }

    #[test]
    fn test_deserialization_recomputes_adjusted_yield() {
        let json = r#"{
            "crop": "wheat",
            "base_yield": 3.5,
            "adjusted_yield": -2.0,
            "multipliers": { "ndvi": 1.0, "soil_moisture": 0.5, "temperature": 1.0 }
        }"#;
        let forecast: YieldForecast = serde_json::from_str(json).unwrap();
        assert!((forecast.adjusted_yield() - 1.75).abs() < 1e-9);

        let collapsed = r#"{
            "crop": "rice",
            "base_yield": 4.2,
            "adjusted_yield": 9.0,
            "multipliers": { "ndvi": -1.0, "soil_moisture": 1.0, "temperature": 1.0 }
        }"#;
        let forecast: YieldForecast = serde_json::from_str(collapsed).unwrap();
        assert_eq!(forecast.adjusted_yield(), 0.0);
    }
}
