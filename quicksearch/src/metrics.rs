use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::results::ScanPlan;

/// Counters describing how searches were served.
///
/// Clones share the same counters, so the controller and every executor it
/// spawns report into one place.
#[derive(Debug, Clone)]
pub struct SearchMetrics {
    // Scan plans
    exact_hits: Arc<AtomicU64>,
    refined_scans: Arc<AtomicU64>,
    base_scans: Arc<AtomicU64>,
    entries_scanned: Arc<AtomicU64>,

    // Generation outcomes
    completed: Arc<AtomicU64>,
    canceled: Arc<AtomicU64>,
    faulted: Arc<AtomicU64>,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self {
            exact_hits: Arc::new(AtomicU64::new(0)),
            refined_scans: Arc::new(AtomicU64::new(0)),
            base_scans: Arc::new(AtomicU64::new(0)),
            entries_scanned: Arc::new(AtomicU64::new(0)),
            completed: Arc::new(AtomicU64::new(0)),
            canceled: Arc::new(AtomicU64::new(0)),
            faulted: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records which plan a scan used and how many entries it examined
    pub fn record_scan(&self, plan: ScanPlan, scanned: u64) {
        match plan {
            ScanPlan::Exact => self.exact_hits.fetch_add(1, Ordering::Relaxed),
            ScanPlan::Refined { .. } => self.refined_scans.fetch_add(1, Ordering::Relaxed),
            ScanPlan::Full => self.base_scans.fetch_add(1, Ordering::Relaxed),
        };
        let total = self.entries_scanned.fetch_add(scanned, Ordering::Relaxed) + scanned;
        debug!("Scan {:?} examined {} entries, total: {}", plan, scanned, total);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_canceled(&self) {
        self.canceled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_faulted(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> SearchStats {
        SearchStats {
            exact_hits: self.exact_hits.load(Ordering::Relaxed),
            refined_scans: self.refined_scans.load(Ordering::Relaxed),
            base_scans: self.base_scans.load(Ordering::Relaxed),
            entries_scanned: self.entries_scanned.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            canceled: self.canceled.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Search stats:\n\
             Scans (exact/refined/base): {}/{}/{}\n\
             Entries scanned: {}\n\
             Generations (completed/canceled/faulted): {}/{}/{}",
            stats.exact_hits,
            stats.refined_scans,
            stats.base_scans,
            stats.entries_scanned,
            stats.completed,
            stats.canceled,
            stats.faulted
        );
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`SearchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub exact_hits: u64,
    pub refined_scans: u64,
    pub base_scans: u64,
    pub entries_scanned: u64,
    pub completed: u64,
    pub canceled: u64,
    pub faulted: u64,
}
