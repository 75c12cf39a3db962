use crate::directive::Directive;
use crate::edge::NewEdge;
use crate::error::Result;
use crate::registry::RegistryEntry;
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// FlowManifest
// ---------------------------------------------------------------------------

/// The authored form of the directive graph: a YAML document listing
/// directives, edges, and tool registry rows, applied to the store before a
/// session starts. Order matters: parents before children, and all
/// directives are inserted before any edge, so edge targets always resolve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowManifest {
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub edges: Vec<NewEdge>,
    #[serde(default)]
    pub tools: Vec<RegistryEntry>,
}

impl FlowManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        let manifest: FlowManifest = serde_yaml::from_str(yaml)?;
        Ok(manifest)
    }

    /// Apply to a store. Insertion-time invariants are enforced row by row;
    /// the first violation aborts the apply.
    pub fn apply(&self, store: &GraphStore) -> Result<()> {
        for directive in &self.directives {
            store.insert_directive(directive)?;
        }
        for edge in &self.edges {
            store.insert_edge(edge)?;
        }
        for tool in &self.tools {
            store.upsert_tool(tool)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
