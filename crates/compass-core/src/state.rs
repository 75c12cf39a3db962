use crate::error::{CompassError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationEntry {
    pub directive: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ProjectState
// ---------------------------------------------------------------------------

/// The mutable session state the flow engine reads: which directive the
/// agent is currently working under and which condition tags have been
/// observed. The directive graph itself is read-only during a session; this
/// file is the only thing that moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: String,
    #[serde(default)]
    pub active_directive: Option<String>,
    /// Observed condition tags, e.g. "test_failure", "user_correction".
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub history: Vec<ConsultationEntry>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl ProjectState {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: project.into(),
            active_directive: None,
            conditions: Vec::new(),
            history: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Err(CompassError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let state: ProjectState = serde_yaml::from_str(&data)?;
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::state_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn set_active(&mut self, directive: &str) {
        self.active_directive = Some(directive.to_string());
        self.history.push(ConsultationEntry {
            directive: directive.to_string(),
            timestamp: Utc::now(),
        });
        // Trim history to last 100 entries
        if self.history.len() > 100 {
            self.history.drain(..self.history.len() - 100);
        }
        self.last_updated = Utc::now();
    }

    pub fn clear_active(&mut self) {
        self.active_directive = None;
        self.last_updated = Utc::now();
    }

    pub fn observe_condition(&mut self, tag: &str) {
        if !self.conditions.iter().any(|c| c == tag) {
            self.conditions.push(tag.to_string());
        }
        self.last_updated = Utc::now();
    }

    pub fn clear_condition(&mut self, tag: &str) {
        self.conditions.retain(|c| c != tag);
        self.last_updated = Utc::now();
    }

    pub fn last_consultation(&self) -> Option<&ConsultationEntry> {
        self.history.last()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn state_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut state = ProjectState::new("my-project");
        state.set_active("plan-tasks");
        state.observe_condition("test_failure");
        state.save(dir.path()).unwrap();

        let loaded = ProjectState::load(dir.path()).unwrap();
        assert_eq!(loaded.project, "my-project");
        assert_eq!(loaded.active_directive.as_deref(), Some("plan-tasks"));
        assert_eq!(loaded.conditions, vec!["test_failure"]);
        assert_eq!(loaded.history.len(), 1);
    }

    #[test]
    fn state_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ProjectState::load(dir.path()),
            Err(CompassError::NotInitialized)
        ));
    }

    #[test]
    fn conditions_deduplicate() {
        let mut state = ProjectState::new("proj");
        state.observe_condition("test_failure");
        state.observe_condition("test_failure");
        assert_eq!(state.conditions.len(), 1);

        state.clear_condition("test_failure");
        assert!(state.conditions.is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let mut state = ProjectState::new("proj");
        for i in 0..150 {
            state.set_active(&format!("directive-{i}"));
        }
        assert_eq!(state.history.len(), 100);
        assert_eq!(state.last_consultation().unwrap().directive, "directive-149");
    }
}
