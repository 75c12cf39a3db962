//! Built-in tool implementations and the locator table that makes them
//! loadable.
//!
//! Tool metadata (names, locators, parameter definitions) is seeded into the
//! store at init and read back at startup; the handlers themselves are
//! resolved lazily through [`StaticLoader`] the first time each tool is
//! called. Handlers validate their own arguments and report domain-level
//! failures as structured results — the dispatcher never validates for them.

use compass_core::error::{CompassError, Result};
use compass_core::registry::{RegistryEntry, StaticLoader, ToolLocator};
use compass_core::schema::ParamDef;
use compass_core::value::{ToolOutcome, ToolValue};

pub mod flow;
pub mod project;

pub const FLOW_MODULE: &str = "compass::handlers::flow";
pub const PROJECT_MODULE: &str = "compass::handlers::project";

// ---------------------------------------------------------------------------
// Registry table
// ---------------------------------------------------------------------------

fn entry(
    name: &str,
    module: &str,
    symbol: &str,
    description: &str,
    params: Vec<ParamDef>,
) -> RegistryEntry {
    RegistryEntry {
        name: name.to_string(),
        locator: ToolLocator::new(module, symbol),
        description: description.to_string(),
        params,
        internal: false,
    }
}

/// The build-time tool table. `compass init` persists these rows to the
/// store's tool table; the registry loads them back once at startup.
pub fn builtin_tools() -> Vec<RegistryEntry> {
    vec![
        entry(
            "compass_get_directive",
            FLOW_MODULE,
            "get_directive",
            "Fetch a directive by name, including its workflow and keywords",
            vec![ParamDef::required("name", "str", "Directive name")],
        ),
        entry(
            "compass_list_directives",
            FLOW_MODULE,
            "list_directives",
            "List all directives, optionally filtered by category",
            vec![ParamDef::optional(
                "category",
                "str",
                "orchestration or reference",
            )],
        ),
        entry(
            "compass_next_steps",
            FLOW_MODULE,
            "next_steps",
            "Sequential next steps from the current directive (never includes wildcard edges)",
            vec![ParamDef::optional(
                "directive",
                "str",
                "Current directive; defaults to the active one",
            )],
        ),
        entry(
            "compass_conditional_paths",
            FLOW_MODULE,
            "conditional_paths",
            "Conditional edges for the current directive plus wildcard conditionals, with condition tags",
            vec![ParamDef::optional(
                "directive",
                "str",
                "Current directive; defaults to the active one",
            )],
        ),
        entry(
            "compass_search_references",
            FLOW_MODULE,
            "search_references",
            "Search wildcard reference consultations by keyword, category, or pattern",
            vec![
                ParamDef::optional("keyword", "str", "Intent keyword to match"),
                ParamDef::optional("category", "str", "orchestration or reference"),
                ParamDef::optional("pattern", "str", "Regex over name and description"),
            ],
        ),
        entry(
            "compass_contextual_utilities",
            FLOW_MODULE,
            "contextual_utilities",
            "Utility edges reachable from the current directive, including wildcard utilities",
            vec![
                ParamDef::optional(
                    "directive",
                    "str",
                    "Current directive; defaults to the active one",
                ),
                ParamDef::optional("condition", "str", "Only edges matching this condition tag"),
            ],
        ),
        entry(
            "compass_project_state",
            PROJECT_MODULE,
            "project_state",
            "Current project state: active directive, observed conditions, recent history",
            vec![],
        ),
        entry(
            "compass_set_active",
            PROJECT_MODULE,
            "set_active",
            "Set the active directive the flow engine resolves implicit queries against",
            vec![ParamDef::required("directive", "str", "Directive name")],
        ),
        entry(
            "compass_observe_condition",
            PROJECT_MODULE,
            "observe_condition",
            "Record an observed condition tag (e.g. test_failure) in project state",
            vec![ParamDef::required("condition", "str", "Condition tag")],
        ),
    ]
}

/// The production loader: one registration per (module, symbol) the table
/// above names.
pub fn builtin_loader() -> StaticLoader {
    let mut loader = StaticLoader::new();
    loader.register(FLOW_MODULE, "get_directive", flow::get_directive);
    loader.register(FLOW_MODULE, "list_directives", flow::list_directives);
    loader.register(FLOW_MODULE, "next_steps", flow::next_steps);
    loader.register(FLOW_MODULE, "conditional_paths", flow::conditional_paths);
    loader.register(FLOW_MODULE, "search_references", flow::search_references);
    loader.register(
        FLOW_MODULE,
        "contextual_utilities",
        flow::contextual_utilities,
    );
    loader.register(PROJECT_MODULE, "project_state", project::project_state);
    loader.register(PROJECT_MODULE, "set_active", project::set_active);
    loader.register(
        PROJECT_MODULE,
        "observe_condition",
        project::observe_condition,
    );
    loader
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

/// Expected, domain-level failures become structured results; anything else
/// propagates as an invocation fault.
fn is_domain_failure(err: &CompassError) -> bool {
    matches!(
        err,
        CompassError::NotInitialized
            | CompassError::DirectiveNotFound(_)
            | CompassError::NoActiveDirective
            | CompassError::InvalidPattern(_)
            | CompassError::InvalidCategory(_)
            | CompassError::InvalidFlowType(_)
    )
}

pub(crate) fn domain(result: Result<ToolValue>) -> Result<ToolOutcome> {
    match result {
        Ok(value) => Ok(ToolOutcome::Value(value)),
        Err(err) if is_domain_failure(&err) => Ok(ToolOutcome::failure(err.to_string())),
        Err(err) => Err(err),
    }
}

pub(crate) fn missing_arg(name: &str) -> Result<ToolOutcome> {
    Ok(ToolOutcome::failure(format!(
        "missing required argument: {name}"
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use compass_core::registry::{SymbolLoader, ToolRegistry};

    #[test]
    fn every_builtin_tool_resolves() {
        // Registry completeness: each entry's locator must load.
        let loader = builtin_loader();
        for entry in builtin_tools() {
            loader
                .load(&entry.locator)
                .unwrap_or_else(|e| panic!("{}: {e}", entry.name));
        }
    }

    #[test]
    fn builtin_names_are_unique() {
        ToolRegistry::new(builtin_tools(), Box::new(builtin_loader())).unwrap();
    }

    #[test]
    fn resolving_all_builtins_through_registry() {
        let mut registry =
            ToolRegistry::new(builtin_tools(), Box::new(builtin_loader())).unwrap();
        for name in registry.names() {
            registry.resolve(&name).unwrap();
        }
    }

    #[test]
    fn domain_failures_become_structured_results() {
        let out = domain(Err(CompassError::DirectiveNotFound("ghost".into()))).unwrap();
        match out {
            ToolOutcome::Failure { error, .. } => assert!(error.contains("ghost")),
            other => panic!("expected failure outcome, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_errors_propagate() {
        let io = CompassError::Io(std::io::Error::other("disk gone"));
        assert!(domain(Err(io)).is_err());
    }
}
