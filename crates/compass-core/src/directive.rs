use crate::error::{CompassError, Result};
use crate::paths;
use crate::types::DirectiveCategory;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

/// A named guidance node the agent consults for orchestration or reference.
///
/// Orchestration directives may sit in a hierarchy (`level` + `parent`);
/// reference directives are flat background material and never carry a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub category: DirectiveCategory,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Structured workflow description, free-form JSON authored in the manifest.
    #[serde(default)]
    pub workflow: serde_json::Value,
    /// Path to long-form documentation, relative to the project root.
    #[serde(default)]
    pub doc_path: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence_threshold: f64,
}

fn default_confidence() -> f64 {
    0.7
}

impl Directive {
    pub fn new(name: impl Into<String>, category: DirectiveCategory) -> Self {
        Self {
            name: name.into(),
            category,
            level: None,
            parent: None,
            description: String::new(),
            workflow: serde_json::Value::Null,
            doc_path: None,
            keywords: Vec::new(),
            confidence_threshold: default_confidence(),
        }
    }

    /// Insertion-time invariants that don't need store access. Parent
    /// existence is checked by the store, which can see the full graph.
    pub fn validate(&self) -> Result<()> {
        paths::validate_name(&self.name)?;
        if self.category == DirectiveCategory::Reference && self.level.is_some() {
            return Err(CompassError::ReferenceWithLevel(self.name.clone()));
        }
        Ok(())
    }

    /// Case-insensitive match against the intent keyword list.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case(keyword))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestration_directive_may_carry_level() {
        let mut d = Directive::new("plan-tasks", DirectiveCategory::Orchestration);
        d.level = Some(2);
        d.validate().unwrap();
    }

    #[test]
    fn reference_directive_rejects_level() {
        let mut d = Directive::new("style-guide", DirectiveCategory::Reference);
        d.level = Some(1);
        assert!(matches!(
            d.validate(),
            Err(CompassError::ReferenceWithLevel(_))
        ));
    }

    #[test]
    fn invalid_name_rejected() {
        let d = Directive::new("Not Valid", DirectiveCategory::Orchestration);
        assert!(matches!(
            d.validate(),
            Err(CompassError::InvalidDirectiveName(_))
        ));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let mut d = Directive::new("error-logging", DirectiveCategory::Reference);
        d.keywords = vec!["logging".into(), "errors".into()];
        assert!(d.matches_keyword("Logging"));
        assert!(d.matches_keyword("ERRORS"));
        assert!(!d.matches_keyword("metrics"));
    }
}
