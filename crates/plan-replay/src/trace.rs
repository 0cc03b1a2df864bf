//! Recorded generator traces.
//!
//! One JSON object per line:
//!
//! ```text
//! {"utterance": "...", "small": {"plan": "...", "confidence": 0.82}, "large": {"plan": "..."}}
//! {"utterance": "...", "small": {"plan": "...", "confidence": 0.31}, "large": {"error": "timeout"}}
//! {"utterance": "...", "small": {"plan": "...", "confidence": 0.97}}
//! ```

use anyhow::{Context, Result};
use plan_router::{ModelClass, ScriptedGenerator};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SmallOutput {
    pub plan: String,
    pub confidence: f64,
}

/// What the large generator did for this utterance, if it was recorded.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LargeOutput {
    Plan { plan: String },
    Error { error: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceEntry {
    pub utterance: String,
    pub small: SmallOutput,
    #[serde(default)]
    pub large: Option<LargeOutput>,
}

pub fn parse_trace(raw: &str) -> Result<Vec<TraceEntry>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid trace entry on line {}", idx + 1))
        })
        .collect()
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace {}", path.display()))?;
    parse_trace(&raw)
}

/// Key a trace entry is routed under. Repeated utterances get distinct keys,
/// so each entry is served its own recorded outputs.
pub fn entry_key(index: usize, utterance: &str) -> String {
    format!("#{index} {utterance}")
}

/// Script a small and a large generator from the trace, one slot per entry
/// keyed by [`entry_key`]. An entry without a recorded large output fails if
/// it escalates.
pub fn scripted_generators(entries: &[TraceEntry]) -> (ScriptedGenerator, ScriptedGenerator) {
    let small = ScriptedGenerator::new(ModelClass::Small);
    let large = ScriptedGenerator::new(ModelClass::Large);
    for (index, entry) in entries.iter().enumerate() {
        let key = entry_key(index, &entry.utterance);
        small.push_response(
            key.as_str(),
            entry.small.plan.as_str(),
            Some(entry.small.confidence),
        );
        match &entry.large {
            Some(LargeOutput::Plan { plan }) => large.push_response(key, plan.as_str(), None),
            Some(LargeOutput::Error { error }) => large.push_failure(key, error.as_str()),
            None => large.push_failure(
                key,
                format!("no large plan recorded for trace entry {index}"),
            ),
        }
    }
    (small, large)
}
