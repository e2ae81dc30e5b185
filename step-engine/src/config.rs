// Step configuration
//
// An immutable description of one step request and the predicate deciding
// whether an instrumentation event satisfies it.

use std::num::NonZeroU32;

use crate::builder::StepConfigBuilder;
use crate::element::{AnchorMap, AnchorSet, SourceElementKind, SourceElementSet, SuspendAnchor};
use crate::tag::{EventContext, Tag};

/// Session-side view a step configuration needs while matching
pub trait StepSession {
    /// Kinds enabled for the whole session; used when a step names none itself
    fn enabled_source_elements(&self) -> &SourceElementSet;
}

impl StepSession for SourceElementSet {
    fn enabled_source_elements(&self) -> &SourceElementSet {
        self
    }
}

/// How a step decides which events it stops at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMode {
    /// Match by source element kind, each kind with its own acceptable anchors.
    /// `elements == None` defers to the session's enabled kinds.
    Elements {
        elements: Option<SourceElementSet>,
        anchors: AnchorMap,
    },
    /// Match only events tagged with `tag` and reported at `anchor`
    Tagged { tag: Tag, anchor: SuspendAnchor },
}

/// Debugger step configuration.
///
/// Besides the step depth (chosen by the caller preparing the step), a step
/// is defined by the source elements it can suspend at, the suspend anchors
/// acceptable for each of them, and how many matching events it takes before
/// execution actually suspends:
///
/// - `Statement` steps suspend before statements. Returning to a caller is
///   reported after the `Root` of the call.
/// - `Expression` steps suspend both before and after expressions.
///
/// Instances are created through [`StepConfig::builder`] and never change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    mode: StepMode,
    count: NonZeroU32,
}

impl StepConfig {
    pub(crate) fn new(mode: StepMode, count: NonZeroU32) -> Self {
        Self { mode, count }
    }

    pub fn builder() -> StepConfigBuilder {
        StepConfigBuilder::new()
    }

    /// Whether an event reported at `anchor` with `context` satisfies this step
    pub fn matches<S, C>(&self, session: &S, context: &C, anchor: SuspendAnchor) -> bool
    where
        S: StepSession + ?Sized,
        C: EventContext + ?Sized,
    {
        match &self.mode {
            StepMode::Tagged {
                tag,
                anchor: tag_anchor,
            } => context.has_tag(tag) && *tag_anchor == anchor,
            StepMode::Elements { elements, anchors } => elements
                .as_ref()
                .unwrap_or_else(|| session.enabled_source_elements())
                .iter()
                .any(|&kind| {
                    context.has_kind_tag(kind)
                        && anchors.get(&kind).is_some_and(|set| set.contains(anchor))
                }),
        }
    }

    /// Whether `kind` takes part in this step, i.e. its probes must stay attached
    pub fn contains_source_element<S>(&self, session: &S, kind: SourceElementKind) -> bool
    where
        S: StepSession + ?Sized,
    {
        self.source_elements()
            .unwrap_or_else(|| session.enabled_source_elements())
            .contains(&kind)
    }

    pub fn mode(&self) -> &StepMode {
        &self.mode
    }

    /// Kinds explicitly enabled for this step. `None` means all kinds enabled
    /// in the session.
    pub fn source_elements(&self) -> Option<&SourceElementSet> {
        match &self.mode {
            StepMode::Elements { elements, .. } => elements.as_ref(),
            StepMode::Tagged { .. } => None,
        }
    }

    /// Per-kind suspend anchors; `None` in tag mode
    pub fn suspend_anchors(&self) -> Option<&AnchorMap> {
        match &self.mode {
            StepMode::Elements { anchors, .. } => Some(anchors),
            StepMode::Tagged { .. } => None,
        }
    }

    pub fn suspend_anchors_for(&self, kind: SourceElementKind) -> Option<AnchorSet> {
        self.suspend_anchors()
            .and_then(|anchors| anchors.get(&kind).copied())
    }

    /// Number of matching events needed before the step suspends
    pub fn count(&self) -> u32 {
        self.count.get()
    }

    pub fn tag(&self) -> Option<&Tag> {
        match &self.mode {
            StepMode::Tagged { tag, .. } => Some(tag),
            StepMode::Elements { .. } => None,
        }
    }

    pub fn tag_anchor(&self) -> Option<SuspendAnchor> {
        match &self.mode {
            StepMode::Tagged { anchor, .. } => Some(*anchor),
            StepMode::Elements { .. } => None,
        }
    }
}
