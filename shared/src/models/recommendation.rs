//! Fused recommendation models

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Domain, TelemetrySnapshot, YieldForecast};

/// Bound on the net price/recommendation adjustment
pub const PRICE_ADJUSTMENT_LIMIT: f64 = 0.30;

/// Net price adjustment with its pre-clamp value kept for diagnostics
///
/// Deserialization reads only `raw` and clamps it again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "RawAdjustment")]
pub struct PriceAdjustment {
    raw: f64,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct RawAdjustment {
    raw: f64,
}

impl From<RawAdjustment> for PriceAdjustment {
    fn from(adjustment: RawAdjustment) -> Self {
        PriceAdjustment::from_raw(adjustment.raw)
    }
}

impl PriceAdjustment {
    pub fn from_raw(raw: f64) -> Self {
        let value = if raw.is_finite() {
            raw.clamp(-PRICE_ADJUSTMENT_LIMIT, PRICE_ADJUSTMENT_LIMIT)
        } else {
            0.0
        };
        Self { raw, value }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Clamped value in [-0.30, +0.30]
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn raw(&self) -> f64 {
        self.raw
    }

    pub fn was_clamped(&self) -> bool {
        self.raw != self.value
    }
}

/// Expected direction of market prices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketOutlook {
    Rising,
    Stable,
    Falling,
}

impl MarketOutlook {
    pub fn from_adjustment(adjustment: f64) -> Self {
        if adjustment > 0.1 {
            MarketOutlook::Rising
        } else if adjustment < -0.1 {
            MarketOutlook::Falling
        } else {
            MarketOutlook::Stable
        }
    }
}

/// Output of confidence fusion for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub domain: Domain,
    pub fused_confidence: f64,
    pub price_adjustment: PriceAdjustment,
    pub telemetry_integrated: bool,
    pub market_outlook: Option<MarketOutlook>,
    pub adjusted_price_per_quintal: Option<Decimal>,
    pub snapshot: Option<Arc<TelemetrySnapshot>>,
    pub forecast: Option<YieldForecast>,
}
