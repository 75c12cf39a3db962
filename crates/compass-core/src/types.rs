use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FlowType
// ---------------------------------------------------------------------------

/// The closed set of relationships a flow edge can express.
///
/// Sequential types describe workflow progression; `ReferenceConsultation`,
/// `Utility`, and `Conditional` may additionally originate from the wildcard
/// source, making them reachable from any directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    SequentialBranch,
    CompletionLoop,
    Conditional,
    ErrorHandler,
    CanonicalStep,
    ReferenceConsultation,
    Utility,
}

impl FlowType {
    pub fn all() -> &'static [FlowType] {
        &[
            FlowType::SequentialBranch,
            FlowType::CompletionLoop,
            FlowType::Conditional,
            FlowType::ErrorHandler,
            FlowType::CanonicalStep,
            FlowType::ReferenceConsultation,
            FlowType::Utility,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowType::SequentialBranch => "sequential_branch",
            FlowType::CompletionLoop => "completion_loop",
            FlowType::Conditional => "conditional",
            FlowType::ErrorHandler => "error_handler",
            FlowType::CanonicalStep => "canonical_step",
            FlowType::ReferenceConsultation => "reference_consultation",
            FlowType::Utility => "utility",
        }
    }

    /// Whether an edge of this type may originate from the wildcard source.
    pub fn wildcard_allowed(self) -> bool {
        matches!(
            self,
            FlowType::ReferenceConsultation | FlowType::Utility | FlowType::Conditional
        )
    }

    /// The types returned by "what's next" queries. Wildcard edges are never
    /// part of this set even when their type matches.
    pub fn sequential() -> &'static [FlowType] {
        &[
            FlowType::SequentialBranch,
            FlowType::CompletionLoop,
            FlowType::Conditional,
        ]
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowType {
    type Err = crate::error::CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential_branch" => Ok(FlowType::SequentialBranch),
            "completion_loop" => Ok(FlowType::CompletionLoop),
            "conditional" => Ok(FlowType::Conditional),
            "error_handler" => Ok(FlowType::ErrorHandler),
            "canonical_step" => Ok(FlowType::CanonicalStep),
            "reference_consultation" => Ok(FlowType::ReferenceConsultation),
            "utility" => Ok(FlowType::Utility),
            _ => Err(crate::error::CompassError::InvalidFlowType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DirectiveCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveCategory {
    /// Drives step-by-step workflow progression; may carry a hierarchy level.
    Orchestration,
    /// Consulted for background material only; never carries a level.
    Reference,
}

impl DirectiveCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveCategory::Orchestration => "orchestration",
            DirectiveCategory::Reference => "reference",
        }
    }
}

impl fmt::Display for DirectiveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DirectiveCategory {
    type Err = crate::error::CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orchestration" => Ok(DirectiveCategory::Orchestration),
            "reference" => Ok(DirectiveCategory::Reference),
            _ => Err(crate::error::CompassError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// EdgeSource
// ---------------------------------------------------------------------------

/// The origin of a flow edge: a concrete directive, or the wildcard meaning
/// "reachable from any directive". Modeled as a distinct variant so the
/// wildcard restriction is enforced by type, not by a sentinel string.
/// Serialized as the directive name, with `*` standing in for the wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeSource {
    Directive(String),
    Any,
}

impl From<Option<String>> for EdgeSource {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) => EdgeSource::Directive(name),
            None => EdgeSource::Any,
        }
    }
}

impl Serialize for EdgeSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EdgeSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            Ok(EdgeSource::Any)
        } else {
            Ok(EdgeSource::Directive(s))
        }
    }
}

impl EdgeSource {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, EdgeSource::Any)
    }

    pub fn directive(&self) -> Option<&str> {
        match self {
            EdgeSource::Directive(name) => Some(name),
            EdgeSource::Any => None,
        }
    }
}

impl fmt::Display for EdgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSource::Directive(name) => f.write_str(name),
            EdgeSource::Any => f.write_str("*"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
