//! Telemetry acquisition tests
//!
//! Deterministic simulation, single-flight caching, and location resolution
//! with distance penalties.

use agri_advisory::config::{Config, TelemetryConfig};
use agri_advisory::error::{AppError, AppResult};
use agri_advisory::services::telemetry::{
    telemetry_seed, SimulatedTelemetryProvider, TelemetryProvider, TelemetryService,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use shared::{
    GpsCoordinates, Location, LocationInput, LocationRegistry, TelemetryReading, TelemetrySnapshot,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn settings() -> TelemetryConfig {
    Config::defaults().unwrap().telemetry
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn registry() -> Arc<LocationRegistry> {
    Arc::new(LocationRegistry::india_default())
}

/// Provider that counts calls and takes a while to answer
struct SlowCountingProvider {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl TelemetryProvider for SlowCountingProvider {
    fn name(&self) -> &str {
        "slow_counting"
    }

    async fn fetch(&self, location: &Location, date: NaiveDate) -> AppResult<TelemetrySnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(TelemetrySnapshot::new(TelemetryReading {
            location_id: location.id.clone(),
            date,
            ndvi: 0.6,
            soil_moisture: 40.0,
            temperature: 24.0,
            precipitation: 0.0,
            cloud_cover: 10.0,
            humidity: 50.0,
            confidence: 0.9,
            source: "test".to_string(),
            generated_at: Utc::now(),
        })?)
    }
}

/// Provider whose upstream is always down
struct FailingProvider {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl TelemetryProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self, _location: &Location, _date: NaiveDate) -> AppResult<TelemetrySnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Err(AppError::Internal("upstream unreachable".to_string()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_simulation_is_deterministic_per_key() {
        let provider = SimulatedTelemetryProvider;
        let registry = LocationRegistry::india_default();
        let ludhiana = registry.find("ludhiana").unwrap();

        let first = provider.simulate(ludhiana, date(2024, 3, 15)).unwrap();
        let second = provider.simulate(ludhiana, date(2024, 3, 15)).unwrap();
        assert_eq!(first.ndvi(), second.ndvi());
        assert_eq!(first.soil_moisture(), second.soil_moisture());
        assert_eq!(first.temperature(), second.temperature());
        assert_eq!(first.cloud_cover(), second.cloud_cover());
        assert_eq!(first.confidence(), second.confidence());
        assert_eq!(first.source(), SimulatedTelemetryProvider::SOURCE);
    }

    #[test]
    fn test_seed_differs_by_location_and_date() {
        let base = telemetry_seed("ludhiana", date(2024, 3, 15));
        assert_eq!(base, telemetry_seed("ludhiana", date(2024, 3, 15)));
        assert_ne!(base, telemetry_seed("ludhiana", date(2024, 3, 16)));
        assert_ne!(base, telemetry_seed("jaipur", date(2024, 3, 15)));
    }

    #[test]
    fn test_monsoon_is_wetter_than_dry_season() {
        let provider = SimulatedTelemetryProvider;
        let registry = LocationRegistry::india_default();
        let nagpur = registry.find("nagpur").unwrap();

        let july = provider.simulate(nagpur, date(2024, 7, 20)).unwrap();
        let april = provider.simulate(nagpur, date(2024, 4, 10)).unwrap();
        assert!(july.soil_moisture() > april.soil_moisture());
        assert!(july.cloud_cover() > april.cloud_cover());
        assert!(july.confidence() < april.confidence());
    }

    #[tokio::test]
    async fn test_concurrent_requests_compute_once() {
        let provider = Arc::new(SlowCountingProvider {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        });
        let service = TelemetryService::new(provider.clone(), registry(), settings());
        let resolved = service
            .resolve(Some(&LocationInput::Named("ludhiana".to_string())), None)
            .unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = service.clone();
                let resolved = resolved.clone();
                tokio::spawn(async move { service.snapshot(&resolved, date(2024, 3, 15)).await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.cache_stats().computations, 1);
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_abort_computation() {
        let provider = Arc::new(SlowCountingProvider {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        });
        let service = TelemetryService::new(provider.clone(), registry(), settings());
        let resolved = service.resolve(None, None).unwrap();
        let day = date(2024, 3, 15);

        let cancelled = tokio::time::timeout(Duration::from_millis(5), service.snapshot(&resolved, day)).await;
        assert!(cancelled.is_err());

        let snapshot = service.snapshot(&resolved, day).await.unwrap();
        assert_eq!(snapshot.location_id(), "ludhiana");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_unavailable_and_not_cached() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        });
        let service = TelemetryService::new(provider.clone(), registry(), settings());
        let resolved = service.resolve(None, None).unwrap();

        for _ in 0..2 {
            let result = service.snapshot(&resolved, date(2024, 3, 15)).await;
            assert!(matches!(result, Err(AppError::TelemetryUnavailable(_))));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_failures_reach_provider_once() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
        });
        let service = TelemetryService::new(provider.clone(), registry(), settings());
        let resolved = service.resolve(None, None).unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = service.clone();
                let resolved = resolved.clone();
                tokio::spawn(async move { service.snapshot(&resolved, date(2024, 3, 15)).await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(AppError::TelemetryUnavailable(_))));
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let retry = service.snapshot(&resolved, date(2024, 3, 15)).await;
        assert!(retry.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolution_by_name_state_and_text() {
        let service = TelemetryService::new(Arc::new(SimulatedTelemetryProvider), registry(), settings());

        let by_name = service
            .resolve(Some(&LocationInput::Named("Jaipur".to_string())), None)
            .unwrap();
        assert_eq!(by_name.location.id, "jaipur");
        assert!(!by_name.is_fallback());

        let by_state = service
            .resolve(Some(&LocationInput::Named("Gujarat".to_string())), None)
            .unwrap();
        assert_eq!(by_state.location.id, "ahmedabad");

        let from_text = service
            .resolve(None, Some("cotton prices in Maharashtra this week"))
            .unwrap();
        assert_eq!(from_text.location.id, "nagpur");

        let default = service.resolve(None, Some("when to sow")).unwrap();
        assert_eq!(default.location.id, "ludhiana");

        let unknown = service.resolve(Some(&LocationInput::Named("Atlantis".to_string())), None);
        assert!(matches!(unknown, Err(AppError::UnknownLocation(_))));
    }

    #[test]
    fn test_nearby_coordinates_carry_distance_penalty() {
        let service = TelemetryService::new(Arc::new(SimulatedTelemetryProvider), registry(), settings());

        let exact = service
            .resolve(Some(&LocationInput::Coordinates(GpsCoordinates::new(30.9010, 75.8573))), None)
            .unwrap();
        assert_eq!(exact.location.id, "ludhiana");
        assert_eq!(exact.confidence_penalty, 0.0);

        // Roughly 55 km south of Ludhiana
        let nearby = service
            .resolve(Some(&LocationInput::Coordinates(GpsCoordinates::new(30.40, 75.85))), None)
            .unwrap();
        assert_eq!(nearby.location.id, "ludhiana");
        assert!(nearby.is_fallback());
        let expected = 0.2 * nearby.distance_km / 150.0;
        assert!((nearby.confidence_penalty - expected).abs() < 1e-9);
    }

    #[test]
    fn test_far_coordinates_are_rejected() {
        let service = TelemetryService::new(Arc::new(SimulatedTelemetryProvider), registry(), settings());

        let london = service.resolve(
            Some(&LocationInput::Coordinates(GpsCoordinates::new(51.5074, -0.1278))),
            None,
        );
        assert!(matches!(london, Err(AppError::InvalidLocation { .. })));

        let off_globe = service.resolve(
            Some(&LocationInput::Coordinates(GpsCoordinates::new(123.0, 0.0))),
            None,
        );
        assert!(matches!(off_globe, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_fallback_snapshot_is_penalised_copy() {
        let service = TelemetryService::new(Arc::new(SimulatedTelemetryProvider), registry(), settings());
        let day = date(2024, 11, 2);

        let exact = service.resolve(None, None).unwrap();
        let nearby = service
            .resolve(Some(&LocationInput::Coordinates(GpsCoordinates::new(30.40, 75.85))), None)
            .unwrap();

        let cached = service.snapshot(&exact, day).await.unwrap();
        let penalised = service.snapshot(&nearby, day).await.unwrap();

        let expected = (cached.confidence() - nearby.confidence_penalty).max(0.0);
        assert!((penalised.confidence() - expected).abs() < 1e-9);
        assert_eq!(penalised.ndvi(), cached.ndvi());
        assert_eq!(service.cache_stats().computations, 1);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn day_strategy() -> impl Strategy<Value = NaiveDate> {
        (2020i32..2030, 1u32..=365).prop_map(|(year, ordinal)| {
            NaiveDate::from_yo_opt(year, ordinal).unwrap()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every simulated snapshot satisfies the snapshot bounds
        #[test]
        fn prop_simulated_snapshot_in_bounds(index in 0usize..10, day in day_strategy()) {
            let registry = LocationRegistry::india_default();
            let location = &registry.all()[index];
            let snapshot = SimulatedTelemetryProvider.simulate(location, day).unwrap();

            prop_assert!((-1.0..=1.0).contains(&snapshot.ndvi()));
            prop_assert!((0.0..=100.0).contains(&snapshot.soil_moisture()));
            prop_assert!((0.0..=100.0).contains(&snapshot.cloud_cover()));
            prop_assert!((0.0..=100.0).contains(&snapshot.humidity()));
            prop_assert!(snapshot.precipitation() >= 0.0);
            prop_assert!((0.0..=1.0).contains(&snapshot.confidence()));
        }

        /// The same key always yields the same readings
        #[test]
        fn prop_simulation_repeatable(index in 0usize..10, day in day_strategy()) {
            let registry = LocationRegistry::india_default();
            let location = &registry.all()[index];
            let a = SimulatedTelemetryProvider.simulate(location, day).unwrap();
            let b = SimulatedTelemetryProvider.simulate(location, day).unwrap();
            prop_assert_eq!(a.ndvi(), b.ndvi());
            prop_assert_eq!(a.temperature(), b.temperature());
            prop_assert_eq!(a.humidity(), b.humidity());
        }
    }
}
