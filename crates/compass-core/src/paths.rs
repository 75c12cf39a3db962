use crate::error::{CompassError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const COMPASS_DIR: &str = ".compass";
pub const DOCS_DIR: &str = ".compass/docs";

pub const CONFIG_FILE: &str = ".compass/config.yaml";
pub const STATE_FILE: &str = ".compass/state.yaml";
pub const GRAPH_DB_FILE: &str = ".compass/flow.db";
pub const MANIFEST_FILE: &str = ".compass/flowgraph.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn compass_dir(root: &Path) -> PathBuf {
    root.join(COMPASS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn graph_db_path(root: &Path) -> PathBuf {
    root.join(GRAPH_DB_FILE)
}

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn docs_dir(root: &Path) -> PathBuf {
    root.join(DOCS_DIR)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Validate a directive name: lowercase alphanumeric with interior hyphens
/// or underscores, 1-64 characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(CompassError::InvalidDirectiveName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["plan-tasks", "a", "error_logging", "review-loop-2"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "-leading", "trailing-", "has spaces", "UPPER", "*"] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.compass/config.yaml")
        );
        assert_eq!(graph_db_path(root), PathBuf::from("/tmp/proj/.compass/flow.db"));
        assert_eq!(
            manifest_path(root),
            PathBuf::from("/tmp/proj/.compass/flowgraph.yaml")
        );
    }
}
