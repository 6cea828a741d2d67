//! Telemetry acquisition
//!
//! Snapshots come from a pluggable [`TelemetryProvider`]. The bundled
//! provider is a deterministic simulation: seasonal base curves keyed by day
//! of year and region, plus bounded noise seeded from (location, date).

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sha2::{Digest, Sha256};
use shared::{
    validate_coordinates, GpsCoordinates, Location, LocationInput, LocationRegistry, Region,
    TelemetryReading, TelemetrySnapshot,
};
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use crate::config::TelemetryConfig;
use crate::error::{AppError, AppResult};
use crate::services::telemetry_cache::{CacheKey, CacheStats, TelemetryCache};

/// Source of environmental snapshots
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, location: &Location, date: NaiveDate) -> AppResult<TelemetrySnapshot>;
}

// ============================================================================
// Simulated Provider
// ============================================================================

/// Deterministic seasonal telemetry model
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedTelemetryProvider;

/// Seed derived from the first 8 bytes of sha256("{location}:{date}")
pub fn telemetry_seed(location_id: &str, date: NaiveDate) -> u64 {
    let digest = Sha256::digest(format!("{}:{}", location_id, date).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Gaussian bump centred on `center` (day of year), wrapping around the year
fn seasonal_bump(day: f64, center: f64, width: f64) -> f64 {
    let raw = (day - center).abs();
    let distance = raw.min(365.0 - raw);
    (-0.5 * (distance / width).powi(2)).exp()
}

/// Monsoon intensity in [0, 1]
fn monsoon_intensity(region: Region, day: f64) -> f64 {
    match region {
        Region::North => seasonal_bump(day, 205.0, 30.0),
        Region::West => seasonal_bump(day, 200.0, 35.0),
        // South-west monsoon plus the north-east monsoon in Oct-Dec
        Region::South => {
            (0.7 * seasonal_bump(day, 190.0, 40.0) + 0.6 * seasonal_bump(day, 305.0, 25.0)).min(1.0)
        }
    }
}

/// Seasonal NDVI before noise
fn base_ndvi(region: Region, day: f64) -> f64 {
    let value = match region {
        // Rabi peak in February, kharif peak in September
        Region::North => 0.25 + 0.5 * seasonal_bump(day, 50.0, 30.0) + 0.4 * seasonal_bump(day, 245.0, 30.0),
        Region::South => 0.35 + 0.4 * seasonal_bump(day, 220.0, 40.0) + 0.3 * seasonal_bump(day, 330.0, 35.0),
        Region::West => 0.20 + 0.5 * seasonal_bump(day, 240.0, 35.0) + 0.2 * seasonal_bump(day, 20.0, 30.0),
    };
    value.min(0.9)
}

/// Seasonal air temperature before noise, °C
fn base_temperature(region: Region, day: f64, elevation_m: f64, monsoon: f64) -> f64 {
    let (mean, amplitude, peak_day) = match region {
        Region::North => (25.0, 9.0, 150.0),
        Region::South => (28.0, 3.0, 120.0),
        Region::West => (27.0, 6.0, 135.0),
    };
    let annual = mean + amplitude * (2.0 * PI * (day - peak_day) / 365.0).cos();
    annual - 3.0 * monsoon - 6.5 * elevation_m / 1000.0
}

fn base_soil_moisture(region: Region) -> f64 {
    match region {
        Region::North => 25.0,
        Region::South => 35.0,
        Region::West => 20.0,
    }
}

impl SimulatedTelemetryProvider {
    pub const SOURCE: &'static str = "simulated_sentinel2_modis";

    /// Compute the snapshot for a location and date
    pub fn simulate(&self, location: &Location, date: NaiveDate) -> AppResult<TelemetrySnapshot> {
        let mut rng = StdRng::seed_from_u64(telemetry_seed(&location.id, date));
        let day = date.ordinal() as f64;
        let region = location.region;
        let monsoon = monsoon_intensity(region, day);

        // Draw order is fixed so a key always maps to the same values
        let ndvi = (base_ndvi(region, day) + rng.gen_range(-0.05..=0.05)).clamp(-1.0, 1.0);

        let temperature = base_temperature(region, day, location.elevation_m, monsoon)
            + rng.gen_range(-1.5..=1.5);

        let mut precipitation = 14.0 * monsoon * rng.gen_range(0.5..=1.5);
        if rng.gen_bool(0.1) {
            precipitation += rng.gen_range(0.0..5.0);
        }
        let precipitation = precipitation.max(0.0);

        let cloud_cover =
            (15.0 + 60.0 * monsoon + 1.8 * precipitation + rng.gen_range(-10.0..=10.0)).clamp(0.0, 100.0);

        let soil_moisture = (base_soil_moisture(region)
            + 25.0 * monsoon
            + (2.0 * precipitation).min(30.0)
            + rng.gen_range(-5.0..=5.0))
        .clamp(0.0, 100.0);

        let humidity =
            (40.0 + 40.0 * monsoon + 0.2 * cloud_cover + rng.gen_range(-5.0..=5.0)).clamp(10.0, 100.0);

        // Clouds obstruct the optical sensor
        let confidence =
            (0.95 - 0.6 * cloud_cover / 100.0 + rng.gen_range(-0.02..=0.02)).clamp(0.05, 0.98);

        let snapshot = TelemetrySnapshot::new(TelemetryReading {
            location_id: location.id.clone(),
            date,
            ndvi: round_to(ndvi, 3),
            soil_moisture: round_to(soil_moisture, 1),
            temperature: round_to(temperature, 1),
            precipitation: round_to(precipitation, 1),
            cloud_cover: round_to(cloud_cover, 1),
            humidity: round_to(humidity, 1),
            confidence: round_to(confidence, 3),
            source: Self::SOURCE.to_string(),
            generated_at: Utc::now(),
        })?;

        Ok(snapshot)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[async_trait]
impl TelemetryProvider for SimulatedTelemetryProvider {
    fn name(&self) -> &str {
        Self::SOURCE
    }

    async fn fetch(&self, location: &Location, date: NaiveDate) -> AppResult<TelemetrySnapshot> {
        self.simulate(location, date)
    }
}

// ============================================================================
// Location Resolution
// ============================================================================

/// A monitoring point chosen for a request
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub location: Location,
    /// Distance from the requested coordinates, 0 for named lookups
    pub distance_km: f64,
    /// Confidence penalty for using a nearby point instead of the exact one
    pub confidence_penalty: f64,
}

impl ResolvedLocation {
    fn exact(location: &Location) -> Self {
        Self {
            location: location.clone(),
            distance_km: 0.0,
            confidence_penalty: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence_penalty > 0.0
    }
}

// ============================================================================
// Telemetry Service
// ============================================================================

/// Resolves locations and serves cached snapshots
#[derive(Clone)]
pub struct TelemetryService {
    provider: Arc<dyn TelemetryProvider>,
    cache: Arc<TelemetryCache>,
    registry: Arc<LocationRegistry>,
    settings: TelemetryConfig,
}

impl TelemetryService {
    pub fn new(
        provider: Arc<dyn TelemetryProvider>,
        registry: Arc<LocationRegistry>,
        settings: TelemetryConfig,
    ) -> Self {
        let cache = Arc::new(TelemetryCache::new(Duration::from_secs(settings.cache_ttl_secs)));
        Self {
            provider,
            cache,
            registry,
            settings,
        }
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Pick the monitoring point for a request
    ///
    /// Without an explicit location, a state or city named in `query_text`
    /// is used, then the configured default.
    pub fn resolve(
        &self,
        input: Option<&LocationInput>,
        query_text: Option<&str>,
    ) -> AppResult<ResolvedLocation> {
        match input {
            Some(LocationInput::Named(name)) => self
                .registry
                .find(name)
                .or_else(|| self.registry.find_by_state(name))
                .map(ResolvedLocation::exact)
                .ok_or_else(|| AppError::UnknownLocation(name.clone())),
            Some(LocationInput::Coordinates(coordinates)) => self.resolve_coordinates(coordinates),
            None => {
                let mentioned = query_text.and_then(|text| self.registry.mentioned_in(text));
                mentioned
                    .or_else(|| self.registry.find(&self.settings.default_location))
                    .map(ResolvedLocation::exact)
                    .ok_or_else(|| {
                        AppError::Configuration(format!(
                            "default location {} is not registered",
                            self.settings.default_location
                        ))
                    })
            }
        }
    }

    fn resolve_coordinates(&self, coordinates: &GpsCoordinates) -> AppResult<ResolvedLocation> {
        validate_coordinates(coordinates).map_err(|msg| {
            AppError::validation("location", msg, "अक्षांश या देशांतर मान्य नहीं है")
        })?;

        let (location, distance_km) = self
            .registry
            .nearest(coordinates)
            .ok_or_else(|| AppError::Configuration("location registry is empty".to_string()))?;

        if distance_km > self.settings.max_fallback_distance_km {
            return Err(AppError::InvalidLocation {
                location: format!("{:.4},{:.4}", coordinates.latitude, coordinates.longitude),
                nearest_km: distance_km,
            });
        }

        let confidence_penalty = if distance_km <= self.settings.exact_match_radius_km {
            0.0
        } else {
            self.settings.max_distance_penalty * distance_km / self.settings.max_fallback_distance_km
        };

        if confidence_penalty > 0.0 {
            tracing::debug!(
                location = %location.id,
                distance_km,
                confidence_penalty,
                "Using nearest monitoring point"
            );
        }

        Ok(ResolvedLocation {
            location: location.clone(),
            distance_km,
            confidence_penalty,
        })
    }

    /// Snapshot for a resolved location, single-flight per (location, date)
    ///
    /// Distance penalties are applied to a copy; the cached value is shared
    /// unchanged.
    pub async fn snapshot(
        &self,
        resolved: &ResolvedLocation,
        date: NaiveDate,
    ) -> AppResult<Arc<TelemetrySnapshot>> {
        let key = CacheKey::new(resolved.location.id.clone(), date);
        let provider = Arc::clone(&self.provider);
        let location = resolved.location.clone();

        let snapshot = self
            .cache
            .get_or_compute(key, move || async move {
                provider.fetch(&location, date).await.map_err(|e| match e {
                    AppError::TelemetryUnavailable(_) => e,
                    other => AppError::TelemetryUnavailable(other.to_string()),
                })
            })
            .await?;

        if resolved.is_fallback() {
            Ok(Arc::new(
                snapshot.with_confidence_penalty(resolved.confidence_penalty),
            ))
        } else {
            Ok(snapshot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn service() -> TelemetryService {
        let config = Config::defaults().unwrap();
        TelemetryService::new(
            Arc::new(SimulatedTelemetryProvider),
            Arc::new(LocationRegistry::india_default()),
            config.telemetry,
        )
    }

    #[test]
    fn test_seed_is_stable_per_key() {
        let d = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        assert_eq!(telemetry_seed("nagpur", d), telemetry_seed("nagpur", d));
        assert_ne!(telemetry_seed("nagpur", d), telemetry_seed("jaipur", d));
        assert_ne!(
            telemetry_seed("nagpur", d),
            telemetry_seed("nagpur", d.succ_opt().unwrap())
        );
    }

    #[test]
    fn test_seasonal_bump_wraps_year_end() {
        assert!((seasonal_bump(360.0, 5.0, 10.0) - seasonal_bump(15.0, 5.0, 10.0)).abs() < 1e-12);
        assert_eq!(seasonal_bump(100.0, 100.0, 20.0), 1.0);
    }

    #[test]
    fn test_resolve_named_and_default() {
        let service = service();
        let named = service
            .resolve(Some(&LocationInput::Named("Punjab".into())), None)
            .unwrap();
        assert_eq!(named.location.id, "ludhiana");

        let from_text = service
            .resolve(None, Some("Gujarat mein kapas ka bhav"))
            .unwrap();
        assert_eq!(from_text.location.id, "ahmedabad");

        let default = service.resolve(None, Some("pani kab dena hai")).unwrap();
        assert_eq!(default.location.id, "ludhiana");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let result = service().resolve(Some(&LocationInput::Named("Atlantis".into())), None);
        assert!(matches!(result, Err(AppError::UnknownLocation(_))));
    }
}
