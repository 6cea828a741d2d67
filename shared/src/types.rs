//! Common types used across the platform

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// GPS coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance using the haversine formula
    pub fn distance_km(&self, other: &GpsCoordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = ((dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2))
            .clamp(0.0, 1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Supported query languages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "hi", alias = "hindi")]
    Hindi,
    /// Code-switched text (Hinglish or mixed scripts)
    #[serde(rename = "mixed", alias = "hinglish")]
    Mixed,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Mixed => "mixed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "hi" | "hindi" => Some(Language::Hindi),
            "mixed" | "hinglish" => Some(Language::Mixed),
            _ => None,
        }
    }

    /// Whether generated text should lead with Hindi
    pub fn prefers_hindi(&self) -> bool {
        !matches!(self, Language::English)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_delhi_ludhiana() {
        let delhi = GpsCoordinates::new(28.7041, 77.1025);
        let ludhiana = GpsCoordinates::new(30.9010, 75.8573);
        let d = delhi.distance_km(&ludhiana);
        assert!(d > 260.0 && d < 290.0, "got {}", d);
        assert!(delhi.distance_km(&delhi).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(GpsCoordinates::new(12.97, 77.59).is_valid());
        assert!(!GpsCoordinates::new(95.0, 77.59).is_valid());
        assert!(!GpsCoordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::from_code("HI"), Some(Language::Hindi));
        assert_eq!(Language::from_code("hinglish"), Some(Language::Mixed));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(
            serde_json::to_string(&Language::Mixed).unwrap(),
            "\"mixed\""
        );
        let parsed: Language = serde_json::from_str("\"hindi\"").unwrap();
        assert_eq!(parsed, Language::Hindi);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_distance_symmetric_and_non_negative(
                lat_a in -90.0f64..=90.0,
                lon_a in -180.0f64..=180.0,
                lat_b in -90.0f64..=90.0,
                lon_b in -180.0f64..=180.0,
            ) {
                let a = GpsCoordinates::new(lat_a, lon_a);
                let b = GpsCoordinates::new(lat_b, lon_b);
                let ab = a.distance_km(&b);
                prop_assert!(ab >= 0.0);
                prop_assert!((ab - b.distance_km(&a)).abs() < 1e-6);
                // Half the earth's circumference
                prop_assert!(ab <= 20_016.0);
            }
        }
    }
}
