//! Plan Router Library
//!
//! Routes natural-language utterances between two plan generators:
//! - a cheap, fast **small** generator that reports a confidence score
//! - an expensive, slow **large** generator used for escalations
//!
//! The [`EscalationController`] escalates a request when the small
//! generator's confidence falls into the bottom percentile of its recent
//! history, as long as the share of escalated requests stays under budget.
//!
//! # Usage
//!
//! ```no_run
//! use plan_router::{EscalationController, ModelClass, ScriptedGenerator};
//!
//! # async fn run() -> Result<(), plan_router::RoutingError> {
//! let small = ScriptedGenerator::new(ModelClass::Small).respond("hi", "( Yield )", Some(0.9));
//! let large = ScriptedGenerator::new(ModelClass::Large);
//! let controller = EscalationController::new(small, large);
//!
//! let routed = controller.generate_plan("hi").await?;
//! println!("{} via {}", routed.plan, routed.source);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod escalation;
pub mod generator;

pub use config::RouterConfig;
pub use error::{ConfigError, GeneratorError, RoutingError, WindowError};
pub use escalation::{
    ConfidenceWindow, DecisionReason, DynEscalationController, EscalationController,
    EscalationDecision, RoutedPlan, UsageSnapshot, UsageTracker,
};
pub use generator::{GeneratedPlan, ModelClass, PlanGenerator, ScriptedGenerator};
