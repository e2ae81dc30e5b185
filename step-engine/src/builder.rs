// Builder of step configurations
//
// Every option except suspend anchors can be set at most once. Suspend
// anchors accumulate per kind, and the last call for a kind wins.

use std::num::NonZeroU32;

use tracing::debug;

use crate::config::{StepConfig, StepMode};
use crate::element::{
    default_anchor_table, AnchorMap, AnchorSet, SourceElementKind, SourceElementSet, SuspendAnchor,
};
use crate::error::{StepConfigError, StepConfigResult};
use crate::tag::Tag;

/// Field that accepts exactly one write
#[derive(Debug, Clone)]
struct SetOnce<T>(Option<T>);

impl<T> SetOnce<T> {
    const fn unset() -> Self {
        SetOnce(None)
    }

    fn is_set(&self) -> bool {
        self.0.is_some()
    }

    fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    fn ensure_unset(&self, what: &str) -> StepConfigResult<()> {
        if self.is_set() {
            return Err(StepConfigError::state(format!(
                "{} can only be set once per builder",
                what
            )));
        }
        Ok(())
    }

    /// Store `value`, failing if already set
    fn set(&mut self, value: T, what: &str) -> StepConfigResult<()> {
        self.ensure_unset(what)?;
        self.0 = Some(value);
        Ok(())
    }
}

/// Builder of [`StepConfig`].
///
/// Setters consume the builder and hand it back on success, so options chain
/// with `?`. A failed setter drops the builder; start over with a new one.
///
/// ```
/// use step_engine::{SourceElementKind, StepConfig, SuspendAnchor};
///
/// let config = StepConfig::builder()
///     .source_elements(&[SourceElementKind::Statement])?
///     .suspend_anchors(SourceElementKind::Statement, &[SuspendAnchor::After])?
///     .count(2)?
///     .build();
/// assert_eq!(config.count(), 2);
/// # Ok::<(), step_engine::StepConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StepConfigBuilder {
    elements: SetOnce<SourceElementSet>,
    anchors: AnchorMap,
    count: SetOnce<NonZeroU32>,
    tag: SetOnce<(Tag, SuspendAnchor)>,
}

impl Default for StepConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StepConfigBuilder {
    pub fn new() -> Self {
        Self {
            elements: SetOnce::unset(),
            anchors: AnchorMap::new(),
            count: SetOnce::unset(),
            tag: SetOnce::unset(),
        }
    }

    /// Source elements enabled for the step. They should be a subset of the
    /// kinds enabled in the session the step is prepared for. When never
    /// called, the step follows the session's enabled kinds.
    pub fn source_elements(mut self, elements: &[SourceElementKind]) -> StepConfigResult<Self> {
        self.elements.ensure_unset("Step source elements")?;
        if elements.is_empty() {
            return Err(StepConfigError::argument(
                "At least one source element needs to be provided",
            ));
        }
        self.elements.0 = Some(elements.iter().copied().collect());
        Ok(self)
    }

    /// Suspend anchors for one kind, overriding its defaults
    /// (see [`SourceElementKind::default_anchors`]).
    ///
    /// May be called once per kind; calling it again for the same kind
    /// replaces the earlier anchors. A kind that is not part of the step's
    /// elements is accepted and only matters if the kind ends up enabled.
    pub fn suspend_anchors(
        mut self,
        kind: SourceElementKind,
        anchors: &[SuspendAnchor],
    ) -> StepConfigResult<Self> {
        if self.tag.is_set() {
            return Err(StepConfigError::state(
                "Suspend anchors are not compatible with a tag, use one or the other",
            ));
        }
        let set = AnchorSet::from_anchors(anchors).ok_or_else(|| {
            StepConfigError::argument("At least one anchor needs to be provided")
        })?;
        self.anchors.insert(kind, set);
        Ok(self)
    }

    /// Number of matching events before the step suspends
    pub fn count(mut self, count: i32) -> StepConfigResult<Self> {
        let count = u32::try_from(count)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| StepConfigError::argument("Step count must be > 0"))?;
        self.count.set(count, "Step count")?;
        Ok(self)
    }

    /// Stop only at events carrying `tag`, reported at `anchor`.
    ///
    /// Replaces kind based matching entirely.
    pub fn tag(mut self, tag: impl Into<Tag>, anchor: SuspendAnchor) -> StepConfigResult<Self> {
        if !self.anchors.is_empty() {
            return Err(StepConfigError::state(
                "Suspend anchors are not compatible with a tag, use one or the other",
            ));
        }
        self.tag.ensure_unset("Tag and anchor")?;
        let tag = tag.into();
        if tag.is_empty() {
            return Err(StepConfigError::argument("Tag name must not be empty"));
        }
        self.tag.0 = Some((tag, anchor));
        Ok(self)
    }

    /// Create the step configuration. The builder stays usable.
    pub fn build(&self) -> StepConfig {
        let count = self.count.get().copied().unwrap_or(NonZeroU32::MIN);

        let mode = match self.tag.get() {
            Some((tag, anchor)) => {
                if let Some(elements) = self.elements.get() {
                    debug!(?elements, "Tag step ignores source elements");
                }
                StepMode::Tagged {
                    tag: tag.clone(),
                    anchor: *anchor,
                }
            }
            None => StepMode::Elements {
                elements: self.elements.get().cloned(),
                anchors: self.resolve_anchors(),
            },
        };

        let config = StepConfig::new(mode, count);
        debug!(?config, "Built step config");
        config
    }

    /// Configured anchors, with defaults for every relevant kind left unset
    fn resolve_anchors(&self) -> AnchorMap {
        if self.anchors.is_empty() {
            return default_anchor_table().clone();
        }

        let mut anchors = self.anchors.clone();
        let relevant: Vec<SourceElementKind> = match self.elements.get() {
            Some(elements) => elements.iter().copied().collect(),
            None => SourceElementKind::ALL.to_vec(),
        };
        for kind in relevant {
            anchors.entry(kind).or_insert(kind.default_anchors());
        }
        anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::InstrumentationEvent;
    use SourceElementKind::*;
    use SuspendAnchor::*;

    fn is_invalid_state<T>(result: StepConfigResult<T>) -> bool {
        matches!(result, Err(StepConfigError::InvalidState(_)))
    }

    fn is_invalid_argument<T>(result: StepConfigResult<T>) -> bool {
        matches!(result, Err(StepConfigError::InvalidArgument(_)))
    }

    #[test]
    fn test_source_elements_once() {
        let builder = StepConfig::builder().source_elements(&[Statement]).unwrap();
        assert!(is_invalid_state(builder.clone().source_elements(&[Statement])));
        assert!(is_invalid_state(builder.source_elements(&[Expression])));
    }

    #[test]
    fn test_source_elements_empty() {
        assert!(is_invalid_argument(StepConfig::builder().source_elements(&[])));
    }

    #[test]
    fn test_source_elements_state_checked_first() {
        let builder = StepConfig::builder().source_elements(&[Root]).unwrap();
        assert!(is_invalid_state(builder.source_elements(&[])));
    }

    #[test]
    fn test_count() {
        assert!(is_invalid_argument(StepConfig::builder().count(0)));
        assert!(is_invalid_argument(StepConfig::builder().count(-5)));

        let config = StepConfig::builder().count(3).unwrap().build();
        assert_eq!(config.count(), 3);

        let builder = StepConfig::builder().count(3).unwrap();
        assert!(is_invalid_state(builder.clone().count(3)));
        assert!(is_invalid_state(builder.clone().count(7)));
        // Argument validated before state
        assert!(is_invalid_argument(builder.count(0)));
    }

    #[test]
    fn test_tag_once() {
        let builder = StepConfig::builder().tag("call", After).unwrap();
        assert!(is_invalid_state(builder.clone().tag("call", After)));
        assert!(is_invalid_state(builder.tag("other", Before)));
    }

    #[test]
    fn test_tag_empty_name() {
        assert!(is_invalid_argument(StepConfig::builder().tag("", Before)));
    }

    #[test]
    fn test_tag_and_anchors_exclusive() {
        let with_anchors = StepConfig::builder()
            .suspend_anchors(Statement, &[Before])
            .unwrap();
        assert!(is_invalid_state(with_anchors.tag("call", After)));

        let with_tag = StepConfig::builder().tag("call", After).unwrap();
        assert!(is_invalid_state(with_tag.suspend_anchors(Statement, &[Before])));
    }

    #[test]
    fn test_anchors_state_checked_first() {
        let with_tag = StepConfig::builder().tag("call", After).unwrap();
        assert!(is_invalid_state(with_tag.suspend_anchors(Statement, &[])));
    }

    #[test]
    fn test_anchors_empty() {
        assert!(is_invalid_argument(
            StepConfig::builder().suspend_anchors(Statement, &[])
        ));
    }

    #[test]
    fn test_anchors_last_write_wins() {
        let config = StepConfig::builder()
            .suspend_anchors(Statement, &[After])
            .unwrap()
            .suspend_anchors(Statement, &[Before, After])
            .unwrap()
            .suspend_anchors(Statement, &[Before])
            .unwrap()
            .build();

        assert_eq!(config.suspend_anchors_for(Statement), Some(AnchorSet::BEFORE));
    }

    #[test]
    fn test_anchors_filled_for_all_kinds() {
        let config = StepConfig::builder()
            .suspend_anchors(Expression, &[After])
            .unwrap()
            .build();

        let anchors = config.suspend_anchors().unwrap();
        assert_eq!(anchors.len(), SourceElementKind::ALL.len());
        assert_eq!(anchors[&Root], AnchorSet::ALL);
        assert_eq!(anchors[&Statement], AnchorSet::BEFORE);
        assert_eq!(anchors[&Expression], AnchorSet::AFTER);
    }

    #[test]
    fn test_anchors_filled_for_explicit_elements_only() {
        let config = StepConfig::builder()
            .source_elements(&[Statement])
            .unwrap()
            .suspend_anchors(Expression, &[After])
            .unwrap()
            .build();

        let anchors = config.suspend_anchors().unwrap();
        assert_eq!(anchors.get(&Statement), Some(&AnchorSet::BEFORE));
        // Kept even though the step does not enable expressions
        assert_eq!(anchors.get(&Expression), Some(&AnchorSet::AFTER));
        assert_eq!(anchors.get(&Root), None);

        let all_kinds: SourceElementSet = SourceElementKind::ALL.into_iter().collect();
        let expression = InstrumentationEvent::new(After).with_tag(Expression);
        assert!(!config.matches(&all_kinds, &expression, After));
        assert!(!config.matches(&all_kinds, &expression, Before));
        assert!(!config.contains_source_element(&all_kinds, Expression));
    }

    #[test]
    fn test_anchors_outside_elements_unused_by_step() {
        let config = StepConfig::builder()
            .source_elements(&[Statement])
            .unwrap()
            .suspend_anchors(Expression, &[Before])
            .unwrap()
            .build();
        let all_kinds: SourceElementSet = SourceElementKind::ALL.into_iter().collect();

        let expression = InstrumentationEvent::new(Before).with_tag(Expression);
        assert!(!config.matches(&all_kinds, &expression, Before));

        let statement = InstrumentationEvent::new(Before).with_tag(Statement);
        assert!(config.matches(&all_kinds, &statement, Before));
    }

    #[test]
    fn test_anchors_apply_when_session_enables_kind() {
        let config = StepConfig::builder()
            .suspend_anchors(Statement, &[After])
            .unwrap()
            .build();
        let statements: SourceElementSet = [Statement].into_iter().collect();
        let expressions: SourceElementSet = [Expression].into_iter().collect();
        let ctx = InstrumentationEvent::new(After).with_tag(Statement);

        assert!(config.matches(&statements, &ctx, After));
        assert!(!config.matches(&statements, &ctx, Before));
        // Same anchors, but the session does not enable statements
        assert!(!config.matches(&expressions, &ctx, After));
    }

    #[test]
    fn test_tag_discards_elements() {
        let config = StepConfig::builder()
            .source_elements(&[Expression])
            .unwrap()
            .count(2)
            .unwrap()
            .tag(Tag::new("call"), Before)
            .unwrap()
            .build();

        assert_eq!(
            config.mode(),
            &StepMode::Tagged {
                tag: Tag::from("call"),
                anchor: Before
            }
        );
        assert_eq!(config.count(), 2);
    }

    #[test]
    fn test_build_twice() {
        let builder = StepConfig::builder()
            .source_elements(&[Statement])
            .unwrap()
            .count(4)
            .unwrap();

        assert_eq!(builder.build(), builder.build());
    }
}
