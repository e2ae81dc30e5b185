// Source element kinds and suspend anchors
//
// Kinds classify instrumentable program locations; anchors say whether an
// event is reported before or after the located element executes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use crate::tag::Tag;

pub type SourceElementSet = BTreeSet<SourceElementKind>;
pub type AnchorMap = BTreeMap<SourceElementKind, AnchorSet>;

/// Instrumentable program element a step can suspend at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceElementKind {
    /// Call root: entered when a function is called, left when it returns
    Root,
    Statement,
    Expression,
}

impl SourceElementKind {
    pub const ALL: [SourceElementKind; 3] = [
        SourceElementKind::Root,
        SourceElementKind::Statement,
        SourceElementKind::Expression,
    ];

    /// Tag carried by events located at this kind of element
    pub fn tag(self) -> &'static Tag {
        match self {
            SourceElementKind::Root => &crate::tag::ROOT_TAG,
            SourceElementKind::Statement => &crate::tag::STATEMENT_TAG,
            SourceElementKind::Expression => &crate::tag::EXPRESSION_TAG,
        }
    }

    /// Anchors a step suspends at when none were configured for this kind.
    ///
    /// Statements only suspend on entry; returning to a caller is reported
    /// through `Root` after the call. Expressions need both phases since the
    /// value is only known after evaluation.
    pub const fn default_anchors(self) -> AnchorSet {
        match self {
            SourceElementKind::Root => AnchorSet::ALL,
            SourceElementKind::Statement => AnchorSet::BEFORE,
            SourceElementKind::Expression => AnchorSet::ALL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceElementKind::Root => "root",
            SourceElementKind::Statement => "statement",
            SourceElementKind::Expression => "expression",
        }
    }
}

impl fmt::Display for SourceElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default anchors for every known kind, built once per process
pub fn default_anchor_table() -> &'static AnchorMap {
    static TABLE: OnceLock<AnchorMap> = OnceLock::new();
    TABLE.get_or_init(|| {
        SourceElementKind::ALL
            .iter()
            .map(|&kind| (kind, kind.default_anchors()))
            .collect()
    })
}

/// Phase of execution relative to a located event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspendAnchor {
    Before,
    After,
}

impl SuspendAnchor {
    const fn bit(self) -> u8 {
        match self {
            SuspendAnchor::Before => 0b01,
            SuspendAnchor::After => 0b10,
        }
    }
}

impl fmt::Display for SuspendAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuspendAnchor::Before => f.write_str("before"),
            SuspendAnchor::After => f.write_str("after"),
        }
    }
}

/// Non-empty set of suspend anchors
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorSet(u8);

impl AnchorSet {
    pub const BEFORE: AnchorSet = AnchorSet(SuspendAnchor::Before.bit());
    pub const AFTER: AnchorSet = AnchorSet(SuspendAnchor::After.bit());
    pub const ALL: AnchorSet = AnchorSet(SuspendAnchor::Before.bit() | SuspendAnchor::After.bit());

    /// Union of the given anchors, or `None` for an empty list
    pub fn from_anchors(anchors: &[SuspendAnchor]) -> Option<AnchorSet> {
        let bits = anchors.iter().fold(0u8, |bits, anchor| bits | anchor.bit());
        (bits != 0).then_some(AnchorSet(bits))
    }

    pub const fn contains(self, anchor: SuspendAnchor) -> bool {
        self.0 & anchor.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = SuspendAnchor> {
        [SuspendAnchor::Before, SuspendAnchor::After]
            .into_iter()
            .filter(move |&anchor| self.contains(anchor))
    }
}

impl From<SuspendAnchor> for AnchorSet {
    fn from(anchor: SuspendAnchor) -> Self {
        AnchorSet(anchor.bit())
    }
}

impl fmt::Debug for AnchorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
