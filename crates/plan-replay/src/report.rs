use plan_router::{ModelClass, RoutedPlan, RoutingError, UsageSnapshot};
use serde::Serialize;

/// Result of replaying one trace entry.
#[derive(Debug, Serialize)]
pub struct ReplayRecord {
    pub index: usize,
    pub utterance: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Routed(RoutedPlan),
    Failed { error: String },
}

impl ReplayRecord {
    pub fn new(index: usize, utterance: String, result: Result<RoutedPlan, RoutingError>) -> Self {
        let outcome = match result {
            Ok(routed) => Outcome::Routed(routed),
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        };
        Self {
            index,
            utterance,
            outcome,
        }
    }

    /// One human-readable line.
    pub fn render(&self) -> String {
        match &self.outcome {
            Outcome::Routed(routed) => format!(
                "#{:<4} {:<5} conf={:.3} threshold={:.3} ratio={:.3} ({}) {}",
                self.index,
                routed.source,
                routed.decision.confidence,
                routed.decision.threshold,
                routed.decision.escalation_ratio,
                routed.decision.reason,
                self.utterance
            ),
            Outcome::Failed { error } => {
                format!("#{:<4} error {} ({})", self.index, self.utterance, error)
            }
        }
    }
}

/// Totals over a whole replay.
#[derive(Debug, Default, Serialize)]
pub struct ReplaySummary {
    pub requests: usize,
    pub small: usize,
    pub large: usize,
    pub failures: usize,
    pub usage: Option<UsageSnapshot>,
}

impl ReplaySummary {
    pub fn add(&mut self, record: &ReplayRecord) {
        self.requests += 1;
        match &record.outcome {
            Outcome::Routed(routed) if routed.source == ModelClass::Large => self.large += 1,
            Outcome::Routed(_) => self.small += 1,
            Outcome::Failed { .. } => self.failures += 1,
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "{} requests: {} small, {} large, {} failed",
            self.requests, self.small, self.large, self.failures
        );
        if let Some(usage) = &self.usage {
            out.push_str(&format!(
                "\ncounters: total={} escalated={} ratio={:.3} resets={}",
                usage.total_requests, usage.escalated_requests, usage.escalation_ratio, usage.resets
            ));
        }
        out
    }
}
