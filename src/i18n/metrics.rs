//! Overlay metrics.
//!
//! Counts resource fetches, degraded fetches, structured-pass key resolution
//! and sweep rewrites. The engine records into the global instance; tests can
//! build their own.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

pub struct OverlayMetrics {
    /// Translation resources requested
    resource_fetches: AtomicUsize,

    /// Requests that fell back to an empty mapping
    resource_failures: AtomicUsize,

    /// `data-i18n` keys that resolved to a string
    structured_hits: AtomicUsize,

    /// `data-i18n` keys left untranslated
    structured_misses: AtomicUsize,

    /// Text nodes and attributes rewritten by the sweep
    sweep_rewrites: AtomicUsize,
}

static METRICS: OnceLock<OverlayMetrics> = OnceLock::new();

impl OverlayMetrics {
    pub fn new() -> Self {
        Self {
            resource_fetches: AtomicUsize::new(0),
            resource_failures: AtomicUsize::new(0),
            structured_hits: AtomicUsize::new(0),
            structured_misses: AtomicUsize::new(0),
            sweep_rewrites: AtomicUsize::new(0),
        }
    }

    /// Get the process-wide metrics instance.
    pub fn global() -> &'static OverlayMetrics {
        METRICS.get_or_init(OverlayMetrics::new)
    }

    pub fn record_fetch(&self) {
        self.resource_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.resource_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_structured(&self, hits: usize, misses: usize) {
        self.structured_hits.fetch_add(hits, Ordering::Relaxed);
        self.structured_misses.fetch_add(misses, Ordering::Relaxed);
    }

    pub fn record_sweep_rewrites(&self, count: usize) {
        self.sweep_rewrites.fetch_add(count, Ordering::Relaxed);
    }

    pub fn resource_fetches(&self) -> usize {
        self.resource_fetches.load(Ordering::Relaxed)
    }

    pub fn resource_failures(&self) -> usize {
        self.resource_failures.load(Ordering::Relaxed)
    }

    pub fn structured_hits(&self) -> usize {
        self.structured_hits.load(Ordering::Relaxed)
    }

    pub fn structured_misses(&self) -> usize {
        self.structured_misses.load(Ordering::Relaxed)
    }

    pub fn sweep_rewrites(&self) -> usize {
        self.sweep_rewrites.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let hits = self.structured_hits();
        let misses = self.structured_misses();
        let lookups = hits + misses;
        let key_coverage = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        let fetches = self.resource_fetches();
        let failures = self.resource_failures();
        let fetch_success_rate = if fetches > 0 {
            (fetches.saturating_sub(failures) as f64 / fetches as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resource_fetches: fetches,
            resource_failures: failures,
            fetch_success_rate,
            structured_hits: hits,
            structured_misses: misses,
            key_coverage,
            sweep_rewrites: self.sweep_rewrites(),
        }
    }
}

impl Default for OverlayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the overlay counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub resource_fetches: usize,
    pub resource_failures: usize,

    /// Percentage (0-100) of fetches that returned usable JSON
    pub fetch_success_rate: f64,

    pub structured_hits: usize,
    pub structured_misses: usize,

    /// Percentage (0-100) of `data-i18n` keys that resolved
    pub key_coverage: f64,

    pub sweep_rewrites: usize,
}
