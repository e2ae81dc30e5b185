// Step requests as plain data
//
// Lets front ends describe a step in JSON and turn it into a validated
// StepConfig through the builder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::StepConfig;
use crate::element::{SourceElementKind, SuspendAnchor};
use crate::error::StepConfigResult;
use crate::tag::Tag;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_elements: Option<Vec<SourceElementKind>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub suspend_anchors: BTreeMap<SourceElementKind, Vec<SuspendAnchor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    pub name: Tag,
    pub anchor: SuspendAnchor,
}

impl StepRequest {
    /// Validate the request and build its configuration.
    ///
    /// Options are applied as elements, anchors, tag, count, so a request
    /// carrying both anchors and a tag fails on the tag.
    pub fn build(&self) -> StepConfigResult<StepConfig> {
        let mut builder = StepConfig::builder();

        if let Some(elements) = &self.source_elements {
            builder = builder.source_elements(elements)?;
        }
        for (&kind, anchors) in &self.suspend_anchors {
            builder = builder.suspend_anchors(kind, anchors)?;
        }
        if let Some(tag) = &self.tag {
            builder = builder.tag(tag.name.clone(), tag.anchor)?;
        }
        if let Some(count) = self.count {
            builder = builder.count(count)?;
        }

        Ok(builder.build())
    }
}
