//! Scripted plan generator — deterministic, in-memory backend.
//!
//! Responses are queued per utterance and served first-in, first-out. Used
//! to replay recorded traces and to drive the controller in tests without
//! any model behind it.

use super::{GeneratedPlan, ModelClass, PlanGenerator};
use crate::error::GeneratorError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone)]
enum Scripted {
    Plan {
        plan: String,
        confidence: Option<f64>,
    },
    Failure(String),
}

/// Generator that answers from a per-utterance script.
#[derive(Debug)]
pub struct ScriptedGenerator {
    model_class: ModelClass,
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: AtomicU64,
}

impl ScriptedGenerator {
    /// Create an empty script for a generator of the given class.
    pub fn new(model_class: ModelClass) -> Self {
        Self {
            model_class,
            script: Mutex::new(HashMap::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Queue a successful plan for `utterance`.
    pub fn respond(
        self,
        utterance: impl Into<String>,
        plan: impl Into<String>,
        confidence: Option<f64>,
    ) -> Self {
        self.push(
            utterance.into(),
            Scripted::Plan {
                plan: plan.into(),
                confidence,
            },
        );
        self
    }

    /// Queue a failure for `utterance`.
    pub fn fail(self, utterance: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(utterance.into(), Scripted::Failure(message.into()));
        self
    }

    /// Queue a successful plan without consuming the generator.
    pub fn push_response(
        &self,
        utterance: impl Into<String>,
        plan: impl Into<String>,
        confidence: Option<f64>,
    ) {
        self.push(
            utterance.into(),
            Scripted::Plan {
                plan: plan.into(),
                confidence,
            },
        );
    }

    /// Queue a failure without consuming the generator.
    pub fn push_failure(&self, utterance: impl Into<String>, message: impl Into<String>) {
        self.push(utterance.into(), Scripted::Failure(message.into()));
    }

    /// Number of `generate_plan` calls served so far, failures included.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Responses still queued across all utterances.
    pub fn pending(&self) -> usize {
        let script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.values().map(VecDeque::len).sum()
    }

    fn push(&self, utterance: String, entry: Scripted) {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.entry(utterance).or_default().push_back(entry);
    }
}

#[async_trait]
impl PlanGenerator for ScriptedGenerator {
    fn model_class(&self) -> ModelClass {
        self.model_class
    }

    async fn generate_plan(&self, utterance: &str) -> Result<GeneratedPlan, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
            script.get_mut(utterance).and_then(VecDeque::pop_front)
        };
        match next {
            Some(Scripted::Plan { plan, confidence }) => Ok(GeneratedPlan {
                plan,
                model_class: self.model_class,
                confidence,
            }),
            Some(Scripted::Failure(message)) => Err(GeneratorError::RequestFailed(message)),
            None => Err(GeneratorError::NoResponse(utterance.to_string())),
        }
    }
}
