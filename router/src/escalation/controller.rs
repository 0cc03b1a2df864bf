//! Escalation Controller — routes one utterance to the small or large generator
//!
//! Every request goes to the small generator first. Its confidence is pushed
//! into the trailing [`ConfidenceWindow`], and the request escalates to the
//! large generator when the confidence sits at or below the configured
//! percentile of the window *and* the delegation budget tracked by the
//! [`UsageTracker`] still has room.
//!
//! Counting order:
//! - the request is counted as total before the small generator is called,
//!   so it stays counted even when a generator later fails;
//! - the escalated counter only moves after the large generator succeeds;
//! - nothing is rolled back.

use crate::config::RouterConfig;
use crate::error::{ConfigError, RoutingError};
use crate::escalation::tracker::{UsageSnapshot, UsageTracker};
use crate::escalation::window::ConfidenceWindow;
use crate::generator::{GeneratedPlan, ModelClass, PlanGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why the controller did or did not escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Confidence at or below the threshold with budget left
    LowConfidence,
    /// Confidence above the threshold
    ConfidenceAboveThreshold,
    /// Confidence low enough, but the delegation ratio is at its limit
    BudgetExhausted,
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowConfidence => write!(f, "low confidence"),
            Self::ConfidenceAboveThreshold => write!(f, "confidence above threshold"),
            Self::BudgetExhausted => write!(f, "delegation budget exhausted"),
        }
    }
}

/// Per-request escalation decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationDecision {
    /// Confidence reported by the small generator
    pub confidence: f64,
    /// Trailing percentile of the window, including this request's score
    pub threshold: f64,
    /// Delegation ratio seen when deciding
    pub escalation_ratio: f64,
    pub escalate: bool,
    pub reason: DecisionReason,
}

impl EscalationDecision {
    /// Pure decision rule: escalate iff `confidence <= threshold` and
    /// `ratio < max_ratio`. A confidence equal to the threshold escalates.
    pub fn evaluate(confidence: f64, threshold: f64, ratio: f64, max_ratio: f64) -> Self {
        let reason = if confidence > threshold {
            DecisionReason::ConfidenceAboveThreshold
        } else if ratio >= max_ratio {
            DecisionReason::BudgetExhausted
        } else {
            DecisionReason::LowConfidence
        };
        Self {
            confidence,
            threshold,
            escalation_ratio: ratio,
            escalate: reason == DecisionReason::LowConfidence,
            reason,
        }
    }
}

/// Plan returned to the caller, tagged with the generator that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedPlan {
    pub plan: String,
    pub source: ModelClass,
    /// Confidence of the returned plan; usually absent for the large generator
    pub confidence: Option<f64>,
    pub decision: EscalationDecision,
}

impl RoutedPlan {
    pub fn escalated(&self) -> bool {
        self.source == ModelClass::Large
    }

    fn from_generated(
        generated: GeneratedPlan,
        source: ModelClass,
        decision: EscalationDecision,
    ) -> Self {
        Self {
            plan: generated.plan,
            source,
            confidence: generated.confidence,
            decision,
        }
    }
}

/// Controller over trait-object generators.
pub type DynEscalationController =
    EscalationController<Arc<dyn PlanGenerator>, Arc<dyn PlanGenerator>>;

/// Confidence-gated router between a small and a large plan generator.
///
/// Share one instance (e.g. behind an `Arc`) across all request handlers:
/// the window and tracker are meant to see every request.
pub struct EscalationController<S, L> {
    small: S,
    large: L,
    config: RouterConfig,
    window: ConfidenceWindow,
    tracker: UsageTracker,
}

impl<S, L> std::fmt::Debug for EscalationController<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationController")
            .field("config", &self.config)
            .field("window_len", &self.window.len())
            .field("usage", &self.tracker.snapshot())
            .finish()
    }
}

impl<S: PlanGenerator, L: PlanGenerator> EscalationController<S, L> {
    /// Create a controller with the default policy.
    pub fn new(small: S, large: L) -> Self {
        let config = RouterConfig::default();
        Self {
            window: ConfidenceWindow::new(config.window_capacity),
            tracker: UsageTracker::new(config.max_requests_before_reset),
            small,
            large,
            config,
        }
    }

    /// Create a controller with a custom policy.
    pub fn with_config(small: S, large: L, config: RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            window: ConfidenceWindow::new(config.window_capacity),
            tracker: UsageTracker::new(config.max_requests_before_reset),
            small,
            large,
            config,
        })
    }

    /// Produce a plan for `utterance`, escalating to the large generator
    /// when the small generator's confidence is too low.
    ///
    /// Generator failures are returned as-is; there is no fallback from a
    /// failed small generator to the large one.
    pub async fn generate_plan(&self, utterance: &str) -> Result<RoutedPlan, RoutingError> {
        self.tracker.increment_total();

        let small_plan = self.small.generate_plan(utterance).await.map_err(|source| {
            warn!(class = %ModelClass::Small, error = %source, "Plan generation failed");
            RoutingError::Generator {
                class: ModelClass::Small,
                source,
            }
        })?;

        let confidence = small_plan.confidence.ok_or(RoutingError::MissingConfidence {
            class: ModelClass::Small,
        })?;
        info!(confidence, "Small generator produced plan");

        let threshold = self
            .window
            .record_and_percentile(confidence, self.config.percentile_rank)?;
        let ratio = self.tracker.escalation_ratio();
        debug!(
            threshold,
            percentile = self.config.percentile_rank,
            ratio,
            max_ratio = self.config.max_delegation_ratio,
            "Evaluating escalation"
        );

        let decision = EscalationDecision::evaluate(
            confidence,
            threshold,
            ratio,
            self.config.max_delegation_ratio,
        );

        if !decision.escalate {
            debug!(reason = %decision.reason, "Keeping small generator plan");
            return Ok(RoutedPlan::from_generated(small_plan, ModelClass::Small, decision));
        }

        info!(confidence, threshold, ratio, "Escalating to large generator");
        let large_plan = self.large.generate_plan(utterance).await.map_err(|source| {
            warn!(class = %ModelClass::Large, error = %source, "Plan generation failed");
            RoutingError::Generator {
                class: ModelClass::Large,
                source,
            }
        })?;
        self.tracker.increment_escalated();

        Ok(RoutedPlan::from_generated(large_plan, ModelClass::Large, decision))
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Trailing confidence history shared by all requests.
    pub fn window(&self) -> &ConfidenceWindow {
        &self.window
    }

    /// Request counters shared by all requests.
    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    pub fn usage(&self) -> UsageSnapshot {
        self.tracker.snapshot()
    }
}
