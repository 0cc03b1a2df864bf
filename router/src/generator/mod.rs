//! Plan generator abstraction.
//!
//! A plan generator turns an utterance into a structured plan. The router
//! only needs one capability from a backend, [`PlanGenerator::generate_plan`];
//! how the backend produces its output is its own business.

pub mod scripted;

pub use scripted::ScriptedGenerator;

use crate::error::GeneratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Size class of the generator that produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelClass {
    /// Cheap, fast generator that reports a confidence score.
    Small,
    /// Expensive, slow generator used for escalations.
    Large,
}

impl ModelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Large => "large",
        }
    }
}

impl std::fmt::Display for ModelClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plan as returned by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    /// The plan text
    pub plan: String,
    /// Which generator class produced it
    pub model_class: ModelClass,
    /// Self-reported confidence in [0, 1]; large generators usually omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl GeneratedPlan {
    /// Plan from a small generator, which always carries a confidence.
    pub fn small(plan: impl Into<String>, confidence: f64) -> Self {
        Self {
            plan: plan.into(),
            model_class: ModelClass::Small,
            confidence: Some(confidence),
        }
    }

    /// Plan from a large generator, without a confidence score.
    pub fn large(plan: impl Into<String>) -> Self {
        Self {
            plan: plan.into(),
            model_class: ModelClass::Large,
            confidence: None,
        }
    }
}

/// Trait for plan generator backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Class of this generator, used to tag errors and logs.
    fn model_class(&self) -> ModelClass;

    /// Generate a plan for the utterance.
    async fn generate_plan(&self, utterance: &str) -> Result<GeneratedPlan, GeneratorError>;
}

#[async_trait]
impl<T: PlanGenerator + ?Sized> PlanGenerator for Arc<T> {
    fn model_class(&self) -> ModelClass {
        (**self).model_class()
    }

    async fn generate_plan(&self, utterance: &str) -> Result<GeneratedPlan, GeneratorError> {
        (**self).generate_plan(utterance).await
    }
}

#[async_trait]
impl<T: PlanGenerator + ?Sized> PlanGenerator for Box<T> {
    fn model_class(&self) -> ModelClass {
        (**self).model_class()
    }

    async fn generate_plan(&self, utterance: &str) -> Result<GeneratedPlan, GeneratorError> {
        (**self).generate_plan(utterance).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_class_serde_names() {
        assert_eq!(serde_json::to_string(&ModelClass::Small).unwrap(), "\"small\"");
        assert_eq!(serde_json::to_string(&ModelClass::Large).unwrap(), "\"large\"");
        assert_eq!(ModelClass::Large.to_string(), "large");
    }

    #[test]
    fn test_large_plan_omits_confidence() {
        let json = serde_json::to_value(GeneratedPlan::large("( Yield )")).unwrap();
        assert!(json.get("confidence").is_none());
        assert_eq!(json["model_class"], "large");
    }

    #[tokio::test]
    async fn test_arc_dyn_delegates() {
        let scripted =
            ScriptedGenerator::new(ModelClass::Small).respond("hi", "( Yield )", Some(0.7));
        let generator: Arc<dyn PlanGenerator> = Arc::new(scripted);
        assert_eq!(generator.model_class(), ModelClass::Small);
        let plan = generator.generate_plan("hi").await.unwrap();
        assert_eq!(plan.confidence, Some(0.7));
    }
}
