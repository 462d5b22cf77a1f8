/*!
 * Table Statistics
 * Lock-free counters and point-in-time snapshots for an emulated file table
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::errors::EmuError;

/// Running counters, updated with relaxed atomics
#[derive(Debug, Default)]
pub(crate) struct TableCounters {
    registered: AtomicU64,
    unregistered: AtomicU64,
    rejected: AtomicU64,
    forced_closes: AtomicU64,
    close_failures: AtomicU64,
}

impl TableCounters {
    #[inline]
    pub fn record_register(&self) {
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reject(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_unregister(&self) {
        self.unregistered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_close(&self, ok: bool) {
        self.forced_closes.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.close_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, capacity: usize, occupied: usize, lowest_free: Option<usize>) -> TableStats {
        TableStats {
            capacity,
            occupied,
            lowest_free,
            registered_total: self.registered.load(Ordering::Relaxed),
            unregistered_total: self.unregistered.load(Ordering::Relaxed),
            rejected_total: self.rejected.load(Ordering::Relaxed),
            forced_closes_total: self.forced_closes.load(Ordering::Relaxed),
            close_failures_total: self.close_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of table occupancy and lifetime counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub capacity: usize,
    pub occupied: usize,
    /// Index the next registration would claim
    pub lowest_free: Option<usize>,
    pub registered_total: u64,
    pub unregistered_total: u64,
    /// Registrations refused because the table was full
    pub rejected_total: u64,
    pub forced_closes_total: u64,
    pub close_failures_total: u64,
}

impl TableStats {
    pub fn free(&self) -> usize {
        self.capacity - self.occupied
    }

    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.occupied as f64 / self.capacity as f64
    }
}

/// Outcome of a forced teardown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Files closed successfully
    pub closed: usize,
    /// Occupants whose file had already been taken or closed
    pub already_closed: usize,
    pub failures: Vec<EmuError>,
}

impl CleanupReport {
    /// Occupants removed from the table
    pub fn detached(&self) -> usize {
        self.closed + self.already_closed + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
