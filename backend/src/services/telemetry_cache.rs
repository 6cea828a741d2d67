//! Single-flight telemetry snapshot cache
//!
//! One slot per (location, date) key. The first caller for a key spawns the
//! computation; concurrent callers await the same slot and receive the same
//! `Arc`, or the same error. Population runs in its own task, so a cancelled caller does not
//! abort it and never leaves a half-written slot behind.

use chrono::NaiveDate;
use serde::Serialize;
use shared::TelemetrySnapshot;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use crate::error::{AppError, AppResult};

/// Cache key: monitoring point id and calendar date
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub location_id: String,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(location_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location_id: location_id.into(),
            date,
        }
    }
}

/// Outcome shared by every caller waiting on one slot
type SlotOutcome = Result<Arc<TelemetrySnapshot>, String>;

struct CacheSlot {
    created: Instant,
    cell: OnceCell<SlotOutcome>,
}

impl CacheSlot {
    fn new() -> Self {
        Self {
            created: Instant::now(),
            cell: OnceCell::new(),
        }
    }
}

#[derive(Default)]
struct Counters {
    computations: AtomicU64,
    hits: AtomicU64,
}

/// Cache instrumentation
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Underlying computations started
    pub computations: u64,
    /// Lookups served from an already populated slot
    pub hits: u64,
    pub entries: usize,
}

type Slots = Arc<Mutex<HashMap<CacheKey, Arc<CacheSlot>>>>;

pub struct TelemetryCache {
    ttl: Duration,
    slots: Slots,
    counters: Arc<Counters>,
}

impl TelemetryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Return the cached snapshot for `key`, computing it at most once
    ///
    /// Callers that join a computation in flight share its outcome, failures
    /// included. A failed slot is then dropped so a later request retries.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> AppResult<Arc<TelemetrySnapshot>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<TelemetrySnapshot>> + Send + 'static,
    {
        let slot = self.slot_for(&key);

        if let Some(outcome) = slot.cell.get() {
            if outcome.is_ok() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
            }
            return outcome.clone().map_err(AppError::TelemetryUnavailable);
        }

        let counters = Arc::clone(&self.counters);
        let slots = Arc::clone(&self.slots);
        let task = tokio::spawn(async move {
            let outcome = slot
                .cell
                .get_or_init(|| async move {
                    counters.computations.fetch_add(1, Ordering::SeqCst);
                    compute().await.map(Arc::new).map_err(|e| match e {
                        AppError::TelemetryUnavailable(msg) => msg,
                        other => other.to_string(),
                    })
                })
                .await
                .clone();

            if outcome.is_err() {
                let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
                if slots.get(&key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                    slots.remove(&key);
                }
            }
            outcome
        });

        task.await
            .map_err(|e| AppError::Internal(format!("telemetry task aborted: {}", e)))?
            .map_err(AppError::TelemetryUnavailable)
    }

    /// Live slot for `key`, replacing it when expired
    fn slot_for(&self, key: &CacheKey) -> Arc<CacheSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(slot) = slots.get(key) {
            if slot.created.elapsed() < self.ttl {
                return Arc::clone(slot);
            }
        }

        let ttl = self.ttl;
        slots.retain(|_, slot| slot.created.elapsed() < ttl);

        let slot = Arc::new(CacheSlot::new());
        slots.insert(key.clone(), Arc::clone(&slot));
        tracing::debug!(
            location = %key.location_id,
            date = %key.date,
            entries = slots.len(),
            "Telemetry cache slot created"
        );
        slot
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            computations: self.counters.computations.load(Ordering::SeqCst),
            hits: self.counters.hits.load(Ordering::Relaxed),
            entries: self.slots.lock().unwrap_or_else(|e| e.into_inner()).len(),
        }
    }
}
