//! Escalation — confidence-gated routing from the small to the large generator
//!
//! ```text
//! utterance
//!     │
//!     ▼
//! UsageTracker::increment_total
//!     │
//!     ▼
//! small generator ──(error)──► caller
//!     │ confidence
//!     ▼
//! ConfidenceWindow: record, then p-th percentile = threshold
//!     │
//!     ├─ confidence >  threshold        → small plan
//!     ├─ escalated/total >= max ratio   → small plan
//!     │
//!     ▼
//! large generator ──(error)──► caller
//!     │
//!     ▼
//! UsageTracker::increment_escalated → large plan
//! ```

pub mod controller;
pub mod tracker;
pub mod window;

pub use controller::{
    DecisionReason, DynEscalationController, EscalationController, EscalationDecision, RoutedPlan,
};
pub use tracker::{UsageSnapshot, UsageTracker};
pub use window::ConfidenceWindow;
