// Debugger session step tracking
//
// Owns the session-wide enabled kinds and the active step, and counts
// matching events until the step suspends.

use tracing::{debug, info};

use crate::config::{StepConfig, StepSession};
use crate::element::{SourceElementKind, SourceElementSet, SuspendAnchor};
use crate::error::{SessionError, SessionResult, StepConfigError};
use crate::tag::EventContext;

/// Outcome of reporting one event to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    /// No active step, or the event does not satisfy it
    Ignored,
    /// The event matched, but the step needs `remaining` more matches
    Consumed { remaining: u32 },
    /// Suspend now; the step is complete
    Suspend,
}

#[derive(Debug, Clone)]
struct ActiveStep {
    config: StepConfig,
    remaining: u32,
}

#[derive(Debug, Clone)]
pub struct DebuggerSession {
    enabled: SourceElementSet,
    active: Option<ActiveStep>,
}

impl Default for DebuggerSession {
    fn default() -> Self {
        Self {
            enabled: [SourceElementKind::Statement].into_iter().collect(),
            active: None,
        }
    }
}

impl DebuggerSession {
    /// Session enabling statements only
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_elements(elements: &[SourceElementKind]) -> SessionResult<Self> {
        let mut session = Self::default();
        session.set_source_elements(elements)?;
        Ok(session)
    }

    pub fn set_source_elements(&mut self, elements: &[SourceElementKind]) -> SessionResult<()> {
        if elements.is_empty() {
            return Err(StepConfigError::argument(
                "At least one source element needs to be enabled",
            )
            .into());
        }
        self.enabled = elements.iter().copied().collect();
        info!(enabled = ?self.enabled, "Session source elements changed");
        Ok(())
    }

    /// Start stepping with `config`, replacing any step in progress
    pub fn prepare_step(&mut self, config: StepConfig) {
        if let Some(previous) = self.active.take() {
            debug!(remaining = previous.remaining, "Replacing active step");
        }
        info!(count = config.count(), "Step prepared");
        self.active = Some(ActiveStep {
            remaining: config.count(),
            config,
        });
    }

    pub fn cancel_step(&mut self) -> SessionResult<StepConfig> {
        let step = self.active.take().ok_or(SessionError::NoActiveStep)?;
        info!(remaining = step.remaining, "Step cancelled");
        Ok(step.config)
    }

    pub fn active_step(&self) -> Option<&StepConfig> {
        self.active.as_ref().map(|step| &step.config)
    }

    /// Matching events still needed before the active step suspends
    pub fn remaining(&self) -> Option<u32> {
        self.active.as_ref().map(|step| step.remaining)
    }

    /// Feed one instrumentation event through the active step
    pub fn on_event<C>(&mut self, context: &C, anchor: SuspendAnchor) -> StepDecision
    where
        C: EventContext + ?Sized,
    {
        let Some(step) = self.active.as_mut() else {
            return StepDecision::Ignored;
        };
        if !step.config.matches(&self.enabled, context, anchor) {
            return StepDecision::Ignored;
        }

        step.remaining = step.remaining.saturating_sub(1);
        if step.remaining > 0 {
            debug!(remaining = step.remaining, %anchor, "Step event consumed");
            return StepDecision::Consumed {
                remaining: step.remaining,
            };
        }

        self.active = None;
        info!(%anchor, "Step complete, suspending");
        StepDecision::Suspend
    }

    /// Whether probes for `kind` must stay attached
    pub fn is_instrumented(&self, kind: SourceElementKind) -> bool {
        match &self.active {
            Some(step) => step.config.contains_source_element(&self.enabled, kind),
            None => self.enabled.contains(&kind),
        }
    }
}

impl StepSession for DebuggerSession {
    fn enabled_source_elements(&self) -> &SourceElementSet {
        &self.enabled
    }
}
