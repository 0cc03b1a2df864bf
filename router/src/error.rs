//! Error taxonomy for plan routing.
//!
//! Every failure the router can surface is typed here. The router never
//! retries: generator failures are handed back to the caller with the
//! original error attached as `source`.

use crate::generator::ModelClass;
use thiserror::Error;

/// Errors from the trailing confidence window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowError {
    /// Percentile requested before any score was recorded.
    #[error("insufficient data: percentile requested on an empty confidence window")]
    InsufficientData,
}

/// Errors raised by a plan generator backend.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("response parse error: {0}")]
    ParseError(String),

    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// A scripted generator had nothing queued for the utterance.
    #[error("no response scripted for utterance {0:?}")]
    NoResponse(String),
}

/// Errors surfaced by [`EscalationController::generate_plan`].
///
/// [`EscalationController::generate_plan`]: crate::escalation::EscalationController::generate_plan
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The active generator failed. Not retried.
    #[error("{class} plan generator failed: {source}")]
    Generator {
        class: ModelClass,
        #[source]
        source: GeneratorError,
    },

    /// The generator used on the fast path returned a plan without a
    /// confidence score.
    #[error("{class} plan generator returned no confidence score")]
    MissingConfidence { class: ModelClass },

    #[error(transparent)]
    Window(#[from] WindowError),
}

impl RoutingError {
    /// Class of the generator responsible for the failure, if any.
    pub fn generator_class(&self) -> Option<ModelClass> {
        match self {
            Self::Generator { class, .. } | Self::MissingConfidence { class } => Some(*class),
            Self::Window(_) => None,
        }
    }
}

/// Errors from loading or validating [`RouterConfig`](crate::config::RouterConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}
