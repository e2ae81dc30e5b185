// Replay protocol messages
//
// One JSON object per line in both directions.

use serde::{Deserialize, Serialize};
use step_engine::{InstrumentationEvent, SourceElementKind, StepRequest};

/// Input line
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplayMessage {
    /// Change the kinds enabled for the session
    Enable { elements: Vec<SourceElementKind> },
    /// Prepare a step
    Step(StepRequest),
    /// Abandon the active step
    Cancel,
    /// Instrumentation event reported by the program
    Event(InstrumentationEvent),
}

/// Output line
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplayOutput {
    Ok { line: usize },
    Suspended {
        line: usize,
        event: InstrumentationEvent,
        count: u32,
    },
    Error { line: usize, message: String },
}
