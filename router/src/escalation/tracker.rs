//! Usage Tracker — total and escalated request counters with overflow reset
//!
//! Both counters live behind one mutex so that increment-then-check-reset is
//! a single critical section: no reader ever sees a ratio that mixes pre- and
//! post-reset counts. Resetting bounds the counters and turns the delegation
//! ratio into a session-like figure rather than a lifetime one; right after a
//! reset the ratio reads 0.0 again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Default counter value that triggers a reset.
pub const DEFAULT_MAX_REQUESTS: u64 = 100_000;

#[derive(Debug, Default)]
struct Counters {
    total: u64,
    escalated: u64,
    resets: u64,
    last_reset_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of the tracker, read under one lock acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub escalated_requests: u64,
    pub escalation_ratio: f64,
    /// Number of overflow resets since startup
    pub resets: u64,
    pub last_reset_at: Option<DateTime<Utc>>,
}

/// Shared request counters.
#[derive(Debug)]
pub struct UsageTracker {
    max_requests: u64,
    counters: Mutex<Counters>,
}

impl UsageTracker {
    /// Create a tracker that resets when a counter reaches `max_requests`.
    /// A limit of zero is raised to one.
    pub fn new(max_requests: u64) -> Self {
        Self {
            max_requests: max_requests.max(1),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Count one request.
    pub fn increment_total(&self) {
        let mut counters = self.lock();
        counters.total += 1;
        self.check_reset(&mut counters);
    }

    /// Count one escalated request.
    pub fn increment_escalated(&self) {
        let mut counters = self.lock();
        counters.escalated += 1;
        self.check_reset(&mut counters);
    }

    /// `escalated / total`, or 0.0 when nothing has been counted.
    pub fn escalation_ratio(&self) -> f64 {
        let counters = self.lock();
        ratio(&counters)
    }

    pub fn total_requests(&self) -> u64 {
        self.lock().total
    }

    pub fn escalated_requests(&self) -> u64 {
        self.lock().escalated
    }

    /// Counter value that triggers a reset.
    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let counters = self.lock();
        UsageSnapshot {
            total_requests: counters.total,
            escalated_requests: counters.escalated,
            escalation_ratio: ratio(&counters),
            resets: counters.resets,
            last_reset_at: counters.last_reset_at,
        }
    }

    fn check_reset(&self, counters: &mut Counters) {
        if counters.total >= self.max_requests || counters.escalated >= self.max_requests {
            info!(
                total = counters.total,
                escalated = counters.escalated,
                max_requests = self.max_requests,
                "Resetting request counters after reaching the maximum request limit"
            );
            counters.total = 0;
            counters.escalated = 0;
            counters.resets += 1;
            counters.last_reset_at = Some(Utc::now());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS)
    }
}

fn ratio(counters: &Counters) -> f64 {
    if counters.total == 0 {
        0.0
    } else {
        counters.escalated as f64 / counters.total as f64
    }
}
