use crate::handlers;
use compass_core::config::Config;
use compass_core::io;
use compass_core::manifest::FlowManifest;
use compass_core::paths;
use compass_core::state::ProjectState;
use compass_core::store::GraphStore;
use std::path::Path;

/// Starter graph written on first init. Deliberately small: a minimal
/// orchestration spine plus one always-available reference consultation.
const STARTER_MANIFEST: &str = r#"directives:
  - name: plan-tasks
    category: orchestration
    level: 1
    description: Break the goal into ordered, verifiable tasks
    keywords: [plan, decompose]
  - name: implement
    category: orchestration
    level: 2
    description: Execute the current task and keep the build green
    keywords: [implement, code]
  - name: review
    category: orchestration
    level: 3
    description: Review the change against its task before moving on
    keywords: [review, verify]
  - name: project-conventions
    category: reference
    description: Naming, layout, and commit conventions for this project
    keywords: [conventions, style, naming]

edges:
  - source: plan-tasks
    target: implement
    flow_type: sequential_branch
    description: Start executing once tasks are planned
  - source: implement
    target: review
    flow_type: sequential_branch
    description: Every task ends in review
  - source: review
    target: implement
    flow_type: completion_loop
    description: Rework until review passes
  - source: "*"
    target: project-conventions
    flow_type: reference_consultation
    description: Consult conventions from anywhere
"#;

pub fn run(root: &Path, project: Option<&str>) -> anyhow::Result<()> {
    let project = match project {
        Some(p) => p.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string()),
    };

    io::ensure_dir(&paths::compass_dir(root))?;
    io::ensure_dir(&paths::docs_dir(root))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::new(&project).save(root)?;
    }
    let state_path = paths::state_path(root);
    if !state_path.exists() {
        ProjectState::new(&project).save(root)?;
    }

    let manifest_path = paths::manifest_path(root);
    io::write_if_missing(&manifest_path, STARTER_MANIFEST.as_bytes())?;

    let db_path = paths::graph_db_path(root);
    if db_path.exists() {
        println!("compass already initialized at {}", root.display());
        return Ok(());
    }

    let store = GraphStore::open(&db_path)?;
    let manifest = FlowManifest::load(&manifest_path)?;
    manifest.apply(&store)?;
    for entry in handlers::builtin_tools() {
        store.upsert_tool(&entry)?;
    }

    println!(
        "initialized compass for '{}' at {}",
        project,
        root.display()
    );
    println!(
        "  {} directives, {} edges, {} tools",
        manifest.directives.len(),
        manifest.edges.len(),
        handlers::builtin_tools().len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_layout_and_seeds_graph() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), Some("demo")).unwrap();

        assert!(paths::config_path(dir.path()).exists());
        assert!(paths::state_path(dir.path()).exists());
        assert!(paths::manifest_path(dir.path()).exists());
        assert!(paths::graph_db_path(dir.path()).exists());

        let store = GraphStore::open(&paths::graph_db_path(dir.path())).unwrap();
        let directives = store.list_directives().unwrap();
        assert_eq!(directives.len(), 4);
        assert_eq!(
            store.load_tool_entries().unwrap().len(),
            handlers::builtin_tools().len()
        );
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), Some("demo")).unwrap();
        run(dir.path(), Some("demo")).unwrap();

        let store = GraphStore::open(&paths::graph_db_path(dir.path())).unwrap();
        assert_eq!(store.list_directives().unwrap().len(), 4);
    }

    #[test]
    fn starter_manifest_wildcard_survives_roundtrip() {
        let manifest = FlowManifest::parse(STARTER_MANIFEST).unwrap();
        assert!(manifest
            .edges
            .iter()
            .any(|e| matches!(e.source, compass_core::types::EdgeSource::Any)));
    }
}
