use crate::error::{CompassError, Result};
use crate::types::{EdgeSource, FlowType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NewEdge
// ---------------------------------------------------------------------------

/// An edge as authored, before the store assigns it an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEdge {
    pub source: EdgeSource,
    pub target: String,
    pub flow_type: FlowType,
    #[serde(default)]
    pub description: String,
    /// Machine-readable condition tag, matched against observed triggers.
    #[serde(default)]
    pub condition: Option<String>,
}

impl NewEdge {
    pub fn new(source: EdgeSource, target: impl Into<String>, flow_type: FlowType) -> Self {
        Self {
            source,
            target: target.into(),
            flow_type,
            description: String::new(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The wildcard restriction: `*` may source only reference_consultation,
    /// utility, and conditional edges. Checked before anything is persisted.
    pub fn validate(&self) -> Result<()> {
        if self.source.is_wildcard() && !self.flow_type.wildcard_allowed() {
            return Err(CompassError::WildcardNotAllowed {
                flow_type: self.flow_type.to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FlowEdge
// ---------------------------------------------------------------------------

/// A persisted edge. `id` is the insertion-order rowid and doubles as the
/// deterministic tie-break when several edges satisfy the same query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: i64,
    pub source: EdgeSource,
    pub target: String,
    pub flow_type: FlowType,
    pub description: String,
    pub condition: Option<String>,
}

impl FlowEdge {
    /// Whether this edge fires for an observed condition tag. Edges with no
    /// condition tag match any trigger.
    pub fn matches_condition(&self, observed: &str) -> bool {
        match &self.condition {
            Some(tag) => tag == observed,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
