// Instrumentation tags and event contexts
//
// Every instrumentation event carries a set of tags describing what kind of
// program element it was reported for.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use crate::element::{SourceElementKind, SuspendAnchor};

pub(crate) static ROOT_TAG: Tag = Tag::ROOT;
pub(crate) static STATEMENT_TAG: Tag = Tag::STATEMENT;
pub(crate) static EXPRESSION_TAG: Tag = Tag::EXPRESSION;

/// Named tag class attached to instrumented program elements
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Cow<'static, str>);

impl Tag {
    pub const ROOT: Tag = Tag::from_static("root");
    pub const STATEMENT: Tag = Tag::from_static("statement");
    pub const EXPRESSION: Tag = Tag::from_static("expression");

    pub const fn from_static(name: &'static str) -> Self {
        Tag(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Tag(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for Tag {
    fn from(name: &'static str) -> Self {
        Tag::from_static(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag(Cow::Owned(name))
    }
}

impl From<SourceElementKind> for Tag {
    fn from(kind: SourceElementKind) -> Self {
        kind.tag().clone()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context of one instrumentation event, as seen by step matching
pub trait EventContext {
    fn has_tag(&self, tag: &Tag) -> bool;

    fn has_kind_tag(&self, kind: SourceElementKind) -> bool {
        self.has_tag(kind.tag())
    }
}

impl EventContext for BTreeSet<Tag> {
    fn has_tag(&self, tag: &Tag) -> bool {
        self.contains(tag)
    }
}

/// Instrumentation event reported by a running program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationEvent {
    pub tags: BTreeSet<Tag>,
    pub anchor: SuspendAnchor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl InstrumentationEvent {
    pub fn new(anchor: SuspendAnchor) -> Self {
        Self {
            tags: BTreeSet::new(),
            anchor,
            location: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl EventContext for InstrumentationEvent {
    fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }
}
