//! Read-only traversal queries over the directive graph.
//!
//! Queries are partitioned into two classes. Sequential queries
//! (`next_sequential_steps`) describe workflow progression and never include
//! wildcard edges; cross-cutting queries (`search_reference_consultations`,
//! `contextual_utilities`, the wildcard half of `conditional_paths`) are the
//! only way to reach wildcard edges. Mixing the two classes into one result
//! list made the visible option set explode in an earlier design, so the
//! partition is deliberate.

use crate::directive::Directive;
use crate::edge::FlowEdge;
use crate::error::Result;
use crate::state::ProjectState;
use crate::store::GraphStore;
use crate::types::{DirectiveCategory, FlowType};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// StateReader
// ---------------------------------------------------------------------------

/// Minimal view of project state the engine needs to resolve queries that
/// arrive without an explicit current directive.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub active_directive: Option<String>,
    pub conditions: Vec<String>,
}

/// The engine's state collaborator. Callers never pass state through query
/// calls; the engine reads it from here when it needs it.
pub trait StateReader {
    fn snapshot(&self) -> Result<StateSnapshot>;
}

/// Production reader backed by the `.compass/state.yaml` file.
pub struct FileStateReader {
    root: PathBuf,
}

impl FileStateReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StateReader for FileStateReader {
    fn snapshot(&self) -> Result<StateSnapshot> {
        let state = ProjectState::load(&self.root)?;
        Ok(StateSnapshot {
            active_directive: state.active_directive,
            conditions: state.conditions,
        })
    }
}

// ---------------------------------------------------------------------------
// Reference search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ReferenceFilter {
    /// Case-insensitive match against the target's intent keywords.
    pub keyword: Option<String>,
    pub category: Option<DirectiveCategory>,
    /// Regex matched against the target's name and description.
    pub pattern: Option<String>,
}

/// A reference-consultation hit: the wildcard edge plus the directive it
/// points at, so callers don't need a second lookup.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceHit {
    pub edge: FlowEdge,
    pub target: Directive,
}

// ---------------------------------------------------------------------------
// FlowEngine
// ---------------------------------------------------------------------------

pub struct FlowEngine<'a> {
    store: &'a GraphStore,
    state: Box<dyn StateReader + 'a>,
}

impl<'a> FlowEngine<'a> {
    pub fn new(store: &'a GraphStore, state: impl StateReader + 'a) -> Self {
        Self {
            store,
            state: Box::new(state),
        }
    }

    /// Convenience constructor with the file-backed state reader.
    pub fn for_root(store: &'a GraphStore, root: &Path) -> Self {
        Self::new(store, FileStateReader::new(root))
    }

    /// The directive a query applies to: the explicit one if given,
    /// otherwise the active directive from the state reader.
    fn current(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(name) = explicit {
            return Ok(name.to_string());
        }
        self.state
            .snapshot()?
            .active_directive
            .ok_or(crate::error::CompassError::NoActiveDirective)
    }

    /// Sequential-branch, completion-loop, and conditional edges out of the
    /// current directive. Wildcard edges are excluded entirely: mixing
    /// cross-cutting references into "next step" results makes ordinary
    /// navigation ambiguous.
    pub fn next_sequential_steps(&self, current: Option<&str>) -> Result<Vec<FlowEdge>> {
        let current = self.current(current)?;
        self.store.edges_from(&current, FlowType::sequential())
    }

    /// Conditional edges specific to the current directive, then wildcard
    /// conditional edges, each carrying its condition tag for the caller to
    /// match against an observed trigger. Specific-before-wildcard with
    /// insertion order inside each group is the documented tie-break.
    pub fn conditional_paths(&self, current: Option<&str>) -> Result<Vec<FlowEdge>> {
        let current = self.current(current)?;
        let mut edges = self.store.edges_from(&current, &[FlowType::Conditional])?;
        edges.extend(self.store.wildcard_edges(&[FlowType::Conditional])?);
        Ok(edges)
    }

    /// Wildcard reference-consultation edges whose target matches the
    /// filter. Reference material is reachable from any context, so this
    /// query takes no current directive at all.
    pub fn search_reference_consultations(
        &self,
        filter: &ReferenceFilter,
    ) -> Result<Vec<ReferenceHit>> {
        let pattern = filter
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| crate::error::CompassError::InvalidPattern(e.to_string()))?;

        let mut hits = Vec::new();
        for edge in self
            .store
            .wildcard_edges(&[FlowType::ReferenceConsultation])?
        {
            let target = self.store.get_directive(&edge.target)?;
            if let Some(keyword) = &filter.keyword {
                if !target.matches_keyword(keyword) {
                    continue;
                }
            }
            if let Some(category) = filter.category {
                if target.category != category {
                    continue;
                }
            }
            if let Some(re) = &pattern {
                if !re.is_match(&target.name) && !re.is_match(&target.description) {
                    continue;
                }
            }
            hits.push(ReferenceHit { edge, target });
        }
        Ok(hits)
    }

    /// Utility and conditional edges specific to the current directive, then
    /// wildcard utility edges, optionally narrowed to a condition tag.
    /// Edges with no condition tag always survive the filter.
    pub fn contextual_utilities(
        &self,
        current: Option<&str>,
        condition: Option<&str>,
    ) -> Result<Vec<FlowEdge>> {
        let current = self.current(current)?;
        let mut edges = self
            .store
            .edges_from(&current, &[FlowType::Utility, FlowType::Conditional])?;
        edges.extend(self.store.wildcard_edges(&[FlowType::Utility])?);
        if let Some(condition) = condition {
            edges.retain(|e| e.matches_condition(condition));
        }
        Ok(edges)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
