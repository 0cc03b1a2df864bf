//! Confidence Window — bounded trailing history of small-generator scores
//!
//! Keeps the most recent `capacity` confidence scores in insertion order and
//! answers percentile queries over them. Percentiles sort a copy on demand;
//! with the default capacity of 100 that is cheap enough per request.

use crate::error::WindowError;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Default number of scores retained.
pub const DEFAULT_WINDOW_CAPACITY: usize = 100;

/// Thread-safe, fixed-capacity history of confidence scores.
#[derive(Debug)]
pub struct ConfidenceWindow {
    capacity: usize,
    scores: Mutex<VecDeque<f64>>,
}

impl ConfidenceWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            scores: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append a score, evicting the oldest one when the window is full.
    ///
    /// Scores outside [0, 1] are stored as-is.
    pub fn record(&self, score: f64) {
        let mut scores = self.lock();
        Self::push(&mut scores, self.capacity, score);
    }

    /// The `p`-th percentile of the current contents.
    ///
    /// Uses linear interpolation between the two nearest ranks:
    /// `rank = p / 100 * (n - 1)`. `p` is clamped to `[0, 100]`.
    pub fn percentile(&self, p: u8) -> Result<f64, WindowError> {
        let scores = self.lock();
        interpolated_percentile(&scores, p)
    }

    /// Record `score` and compute the `p`-th percentile in one critical
    /// section, so the result always includes the score just recorded.
    pub fn record_and_percentile(&self, score: f64, p: u8) -> Result<f64, WindowError> {
        let mut scores = self.lock();
        Self::push(&mut scores, self.capacity, score);
        interpolated_percentile(&scores, p)
    }

    /// Maximum number of scores retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of scores currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.lock().iter().copied().collect()
    }

    fn push(scores: &mut VecDeque<f64>, capacity: usize, score: f64) {
        scores.push_back(score);
        while scores.len() > capacity {
            scores.pop_front();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<f64>> {
        self.scores.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConfidenceWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

fn interpolated_percentile(scores: &VecDeque<f64>, p: u8) -> Result<f64, WindowError> {
    if scores.is_empty() {
        return Err(WindowError::InsufficientData);
    }

    let mut sorted: Vec<f64> = scores.iter().copied().collect();
    sorted.sort_by(f64::total_cmp);

    let rank = f64::from(p.min(100)) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Ok(sorted[lower]);
    }
    let fraction = rank - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
