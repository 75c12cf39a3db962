//! Persistent storage for the directive flow graph and tool metadata,
//! backed by rusqlite.
//!
//! Connections are short-lived: each store handle owns one connection and
//! callers open a handle per operation batch. Access is serialized by the
//! transport, so there is no pooling and no locking.
//!
//! Wildcard-sourced edges share the `flow_edges` table with a NULL `source`
//! column; the typed [`EdgeSource`] enum is what code sees, and the wildcard
//! restriction is enforced here before anything is persisted.

use crate::directive::Directive;
use crate::edge::{FlowEdge, NewEdge};
use crate::error::{CompassError, Result};
use crate::registry::{RegistryEntry, ToolLocator};
use crate::types::{DirectiveCategory, EdgeSource, FlowType};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS directives (
    name TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    level INTEGER,
    parent TEXT,
    description TEXT NOT NULL DEFAULT '',
    workflow TEXT NOT NULL DEFAULT 'null',
    doc_path TEXT,
    keywords TEXT NOT NULL DEFAULT '[]',
    confidence_threshold REAL NOT NULL DEFAULT 0.7
);

CREATE TABLE IF NOT EXISTS flow_edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT,
    target TEXT NOT NULL,
    flow_type TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    condition TEXT
);

CREATE TABLE IF NOT EXISTS tools (
    name TEXT PRIMARY KEY,
    module TEXT NOT NULL,
    symbol TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    params TEXT NOT NULL DEFAULT '[]',
    internal INTEGER NOT NULL DEFAULT 0
);
";

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Open or create the store at `path`, ensuring the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ---------------------------------------------------------------------------
    // Directives
    // ---------------------------------------------------------------------------

    pub fn insert_directive(&self, directive: &Directive) -> Result<()> {
        directive.validate()?;
        if self.directive_exists(&directive.name)? {
            return Err(CompassError::DirectiveExists(directive.name.clone()));
        }
        if let Some(parent) = &directive.parent {
            if !self.directive_exists(parent)? {
                return Err(CompassError::UnknownParent {
                    directive: directive.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
        self.conn.execute(
            "INSERT INTO directives
               (name, category, level, parent, description, workflow, doc_path,
                keywords, confidence_threshold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                directive.name,
                directive.category.as_str(),
                directive.level.map(|l| l as i64),
                directive.parent,
                directive.description,
                serde_json::to_string(&directive.workflow)?,
                directive.doc_path,
                serde_json::to_string(&directive.keywords)?,
                directive.confidence_threshold,
            ],
        )?;
        Ok(())
    }

    pub fn directive_exists(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM directives WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_directive(&self, name: &str) -> Result<Directive> {
        let row = self
            .conn
            .query_row(
                "SELECT name, category, level, parent, description, workflow,
                        doc_path, keywords, confidence_threshold
                 FROM directives WHERE name = ?1",
                params![name],
                directive_row,
            )
            .optional()?;
        match row {
            Some(raw) => raw.into_directive(),
            None => Err(CompassError::DirectiveNotFound(name.to_string())),
        }
    }

    pub fn list_directives(&self) -> Result<Vec<Directive>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, category, level, parent, description, workflow,
                    doc_path, keywords, confidence_threshold
             FROM directives ORDER BY name",
        )?;
        let rows = stmt.query_map([], directive_row)?;
        let mut directives = Vec::new();
        for row in rows {
            directives.push(row?.into_directive()?);
        }
        Ok(directives)
    }

    // ---------------------------------------------------------------------------
    // Edges
    // ---------------------------------------------------------------------------

    /// Insert an edge, enforcing every insertion-time invariant before the
    /// row is persisted: the wildcard restriction, target existence, and
    /// (for concrete sources) source existence.
    pub fn insert_edge(&self, edge: &NewEdge) -> Result<i64> {
        edge.validate()?;
        if !self.directive_exists(&edge.target)? {
            return Err(CompassError::UnknownEdgeTarget(edge.target.clone()));
        }
        if let Some(source) = edge.source.directive() {
            if !self.directive_exists(source)? {
                return Err(CompassError::UnknownEdgeSource(source.to_string()));
            }
        }
        self.conn.execute(
            "INSERT INTO flow_edges (source, target, flow_type, description, condition)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                edge.source.directive(),
                edge.target,
                edge.flow_type.as_str(),
                edge.description,
                edge.condition,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Edges whose source is the given concrete directive, filtered to the
    /// given flow types. Wildcard edges never appear here. Results are in
    /// insertion order (the documented tie-break).
    pub fn edges_from(&self, source: &str, types: &[FlowType]) -> Result<Vec<FlowEdge>> {
        if !self.directive_exists(source)? {
            return Err(CompassError::DirectiveNotFound(source.to_string()));
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, source, target, flow_type, description, condition
             FROM flow_edges WHERE source = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![source], edge_row)?;
        collect_edges(rows, types)
    }

    /// Wildcard-sourced edges of the given flow types, in insertion order.
    pub fn wildcard_edges(&self, types: &[FlowType]) -> Result<Vec<FlowEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source, target, flow_type, description, condition
             FROM flow_edges WHERE source IS NULL ORDER BY id",
        )?;
        let rows = stmt.query_map([], edge_row)?;
        collect_edges(rows, types)
    }

    // ---------------------------------------------------------------------------
    // Tool metadata
    // ---------------------------------------------------------------------------

    pub fn upsert_tool(&self, entry: &RegistryEntry) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tools (name, module, symbol, description, params, internal)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.name,
                entry.locator.module,
                entry.locator.symbol,
                entry.description,
                serde_json::to_string(&entry.params)?,
                entry.internal as i64,
            ],
        )?;
        Ok(())
    }

    /// Load every registry entry, sorted by name. Called once at startup.
    pub fn load_tool_entries(&self) -> Result<Vec<RegistryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, module, symbol, description, params, internal
             FROM tools ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (name, module, symbol, description, params, internal) = row?;
            entries.push(RegistryEntry {
                name,
                locator: ToolLocator::new(module, symbol),
                description,
                params: serde_json::from_str(&params)?,
                internal: internal != 0,
            });
        }
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

struct DirectiveRow {
    name: String,
    category: String,
    level: Option<i64>,
    parent: Option<String>,
    description: String,
    workflow: String,
    doc_path: Option<String>,
    keywords: String,
    confidence_threshold: f64,
}

impl DirectiveRow {
    fn into_directive(self) -> Result<Directive> {
        Ok(Directive {
            name: self.name,
            category: DirectiveCategory::from_str(&self.category)?,
            level: self.level.map(|l| l as u32),
            parent: self.parent,
            description: self.description,
            workflow: serde_json::from_str(&self.workflow)?,
            doc_path: self.doc_path,
            keywords: serde_json::from_str(&self.keywords)?,
            confidence_threshold: self.confidence_threshold,
        })
    }
}

fn directive_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DirectiveRow> {
    Ok(DirectiveRow {
        name: row.get(0)?,
        category: row.get(1)?,
        level: row.get(2)?,
        parent: row.get(3)?,
        description: row.get(4)?,
        workflow: row.get(5)?,
        doc_path: row.get(6)?,
        keywords: row.get(7)?,
        confidence_threshold: row.get(8)?,
    })
}

struct EdgeRow {
    id: i64,
    source: Option<String>,
    target: String,
    flow_type: String,
    description: String,
    condition: Option<String>,
}

fn edge_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok(EdgeRow {
        id: row.get(0)?,
        source: row.get(1)?,
        target: row.get(2)?,
        flow_type: row.get(3)?,
        description: row.get(4)?,
        condition: row.get(5)?,
    })
}

fn collect_edges(
    rows: impl Iterator<Item = rusqlite::Result<EdgeRow>>,
    types: &[FlowType],
) -> Result<Vec<FlowEdge>> {
    let mut edges = Vec::new();
    for row in rows {
        let raw = row?;
        let flow_type = FlowType::from_str(&raw.flow_type)?;
        if !types.contains(&flow_type) {
            continue;
        }
        edges.push(FlowEdge {
            id: raw.id,
            source: EdgeSource::from(raw.source),
            target: raw.target,
            flow_type,
            description: raw.description,
            condition: raw.condition,
        });
    }
    Ok(edges)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParamDef;

    fn orchestration(name: &str) -> Directive {
        Directive::new(name, DirectiveCategory::Orchestration)
    }

    fn reference(name: &str) -> Directive {
        Directive::new(name, DirectiveCategory::Reference)
    }

    fn seeded() -> GraphStore {
        let store = GraphStore::open_in_memory().unwrap();
        store.insert_directive(&orchestration("plan-tasks")).unwrap();
        store.insert_directive(&orchestration("implement")).unwrap();
        store.insert_directive(&reference("style-guide")).unwrap();
        store
    }

    #[test]
    fn directive_roundtrip() {
        let store = GraphStore::open_in_memory().unwrap();
        let mut d = orchestration("plan-tasks");
        d.level = Some(2);
        d.description = "Break the milestone into tasks".into();
        d.workflow = serde_json::json!({ "steps": ["scope", "order", "estimate"] });
        d.doc_path = Some(".compass/docs/plan-tasks.md".into());
        d.keywords = vec!["planning".into(), "tasks".into()];
        d.confidence_threshold = 0.9;
        store.insert_directive(&d).unwrap();

        let loaded = store.get_directive("plan-tasks").unwrap();
        assert_eq!(loaded.level, Some(2));
        assert_eq!(loaded.workflow["steps"][0], "scope");
        assert_eq!(loaded.keywords, vec!["planning", "tasks"]);
        assert_eq!(loaded.confidence_threshold, 0.9);
    }

    #[test]
    fn get_unknown_directive_is_not_found() {
        let store = GraphStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get_directive("ghost"),
            Err(CompassError::DirectiveNotFound(_))
        ));
    }

    #[test]
    fn duplicate_directive_rejected() {
        let store = seeded();
        assert!(matches!(
            store.insert_directive(&orchestration("plan-tasks")),
            Err(CompassError::DirectiveExists(_))
        ));
    }

    #[test]
    fn unknown_parent_rejected() {
        let store = GraphStore::open_in_memory().unwrap();
        let mut d = orchestration("child");
        d.parent = Some("missing-root".into());
        assert!(matches!(
            store.insert_directive(&d),
            Err(CompassError::UnknownParent { .. })
        ));
    }

    #[test]
    fn reference_with_level_rejected_before_persist() {
        let store = GraphStore::open_in_memory().unwrap();
        let mut d = reference("style-guide");
        d.level = Some(1);
        assert!(store.insert_directive(&d).is_err());
        assert!(!store.directive_exists("style-guide").unwrap());
    }

    #[test]
    fn wildcard_canonical_step_rejected_before_persist() {
        let store = seeded();
        let edge = NewEdge::new(EdgeSource::Any, "implement", FlowType::CanonicalStep);
        assert!(matches!(
            store.insert_edge(&edge),
            Err(CompassError::WildcardNotAllowed { .. })
        ));
        assert!(store.wildcard_edges(FlowType::all()).unwrap().is_empty());
    }

    #[test]
    fn edge_target_must_exist() {
        let store = seeded();
        let edge = NewEdge::new(
            EdgeSource::Directive("plan-tasks".into()),
            "nowhere",
            FlowType::SequentialBranch,
        );
        assert!(matches!(
            store.insert_edge(&edge),
            Err(CompassError::UnknownEdgeTarget(_))
        ));
    }

    #[test]
    fn wildcard_edge_target_must_exist() {
        let store = seeded();
        let edge = NewEdge::new(EdgeSource::Any, "nowhere", FlowType::Utility);
        assert!(matches!(
            store.insert_edge(&edge),
            Err(CompassError::UnknownEdgeTarget(_))
        ));
    }

    #[test]
    fn concrete_edge_source_must_exist() {
        let store = seeded();
        let edge = NewEdge::new(
            EdgeSource::Directive("ghost".into()),
            "implement",
            FlowType::SequentialBranch,
        );
        assert!(matches!(
            store.insert_edge(&edge),
            Err(CompassError::UnknownEdgeSource(_))
        ));
    }

    #[test]
    fn edges_from_excludes_wildcard_and_filters_types() {
        let store = seeded();
        store
            .insert_edge(&NewEdge::new(
                EdgeSource::Directive("plan-tasks".into()),
                "implement",
                FlowType::SequentialBranch,
            ))
            .unwrap();
        store
            .insert_edge(&NewEdge::new(
                EdgeSource::Directive("plan-tasks".into()),
                "style-guide",
                FlowType::ReferenceConsultation,
            ))
            .unwrap();
        store
            .insert_edge(&NewEdge::new(
                EdgeSource::Any,
                "style-guide",
                FlowType::ReferenceConsultation,
            ))
            .unwrap();

        let seq = store
            .edges_from("plan-tasks", FlowType::sequential())
            .unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].target, "implement");

        let refs = store
            .wildcard_edges(&[FlowType::ReferenceConsultation])
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].source.is_wildcard());
    }

    #[test]
    fn edges_from_unknown_source_is_not_found() {
        let store = seeded();
        assert!(matches!(
            store.edges_from("ghost", FlowType::all()),
            Err(CompassError::DirectiveNotFound(_))
        ));
    }

    #[test]
    fn edges_preserve_insertion_order() {
        let store = seeded();
        for target in ["implement", "style-guide", "implement"] {
            store
                .insert_edge(
                    &NewEdge::new(
                        EdgeSource::Directive("plan-tasks".into()),
                        target,
                        FlowType::Conditional,
                    )
                    .with_condition(format!("cond-{target}")),
                )
                .unwrap();
        }
        let edges = store
            .edges_from("plan-tasks", &[FlowType::Conditional])
            .unwrap();
        let ids: Vec<i64> = edges.iter().map(|e| e.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(edges[0].target, "implement");
        assert_eq!(edges[1].target, "style-guide");
    }

    #[test]
    fn tool_entries_roundtrip() {
        let store = GraphStore::open_in_memory().unwrap();
        let entry = RegistryEntry {
            name: "compass_next_steps".into(),
            locator: ToolLocator::new("compass::handlers::flow", "next_steps"),
            description: "Sequential next steps from a directive".into(),
            params: vec![ParamDef::optional("directive", "str", "Current directive")],
            internal: false,
        };
        store.upsert_tool(&entry).unwrap();

        let loaded = store.load_tool_entries().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "compass_next_steps");
        assert_eq!(loaded[0].locator.symbol, "next_steps");
        assert_eq!(loaded[0].params.len(), 1);
        assert!(!loaded[0].internal);
    }

    #[test]
    fn upsert_tool_replaces() {
        let store = GraphStore::open_in_memory().unwrap();
        let mut entry = RegistryEntry {
            name: "compass_next_steps".into(),
            locator: ToolLocator::new("compass::handlers::flow", "next_steps"),
            description: "old".into(),
            params: vec![],
            internal: false,
        };
        store.upsert_tool(&entry).unwrap();
        entry.description = "new".into();
        store.upsert_tool(&entry).unwrap();

        let loaded = store.load_tool_entries().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].description, "new");
    }
}
