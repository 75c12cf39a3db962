use crate::error::{CompassError, Result};
use crate::schema::ParamDef;
use crate::value::ToolOutcome;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ToolContext
// ---------------------------------------------------------------------------

/// Per-process context handed to every handler invocation. Handlers open
/// their own short-lived store connections from `root`; nothing here is
/// shared mutable state.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub root: PathBuf,
}

impl ToolContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

// ---------------------------------------------------------------------------
// Locator and entry
// ---------------------------------------------------------------------------

/// Where a tool's implementation lives: a module path plus a symbol name.
/// The registry never hardcodes implementations; it asks a `SymbolLoader`
/// to turn a locator into a callable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolLocator {
    pub module: String,
    pub symbol: String,
}

impl ToolLocator {
    pub fn new(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            symbol: symbol.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub locator: ToolLocator,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    /// Internal helpers are registered but left out of the external catalog.
    #[serde(default)]
    pub internal: bool,
}

// ---------------------------------------------------------------------------
// Handler and loader
// ---------------------------------------------------------------------------

/// A resolved tool implementation. Handlers validate their own arguments and
/// report domain-level failures as `ToolOutcome::Failure`; an `Err` from a
/// handler is an unexpected invocation fault, not a domain result.
pub type Handler =
    Arc<dyn Fn(&ToolContext, &serde_json::Value) -> Result<ToolOutcome> + Send + Sync>;

/// Turns a locator into a callable. The production implementation is a
/// compile-time table ([`StaticLoader`]); tests substitute fakes.
pub trait SymbolLoader {
    fn load(&self, locator: &ToolLocator) -> Result<Handler>;
}

/// Loader backed by a fixed (module, symbol) table.
#[derive(Default)]
pub struct StaticLoader {
    symbols: HashMap<ToolLocator, Handler>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        module: &str,
        symbol: &str,
        handler: impl Fn(&ToolContext, &serde_json::Value) -> Result<ToolOutcome> + Send + Sync + 'static,
    ) {
        self.symbols
            .insert(ToolLocator::new(module, symbol), Arc::new(handler));
    }
}

impl SymbolLoader for StaticLoader {
    fn load(&self, locator: &ToolLocator) -> Result<Handler> {
        self.symbols
            .get(locator)
            .cloned()
            .ok_or_else(|| CompassError::ImportFailure {
                module: locator.module.clone(),
                symbol: locator.symbol.clone(),
                reason: if self.symbols.keys().any(|l| l.module == locator.module) {
                    "no such symbol in module".to_string()
                } else {
                    "no such module".to_string()
                },
            })
    }
}

// ---------------------------------------------------------------------------
// ToolRegistry
// ---------------------------------------------------------------------------

/// Single source of truth mapping tool name to implementation locator.
///
/// Resolution is lazy: the first `resolve` for a name asks the loader and
/// caches the handler; the cache is the only mutable state here and each
/// slot is written at most once per process lifetime.
pub struct ToolRegistry {
    entries: BTreeMap<String, RegistryEntry>,
    loader: Box<dyn SymbolLoader>,
    resolved: HashMap<String, Handler>,
}

impl ToolRegistry {
    pub fn new(entries: Vec<RegistryEntry>, loader: Box<dyn SymbolLoader>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if map.contains_key(&entry.name) {
                return Err(CompassError::ToolExists(entry.name));
            }
            map.insert(entry.name.clone(), entry);
        }
        Ok(Self {
            entries: map,
            loader,
            resolved: HashMap::new(),
        })
    }

    /// All registered names, sorted, for catalog construction.
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entry(&self, name: &str) -> Result<&RegistryEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| CompassError::ToolNotFound(name.to_string()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Resolve a tool name to its handler, loading and caching on first use.
    pub fn resolve(&mut self, name: &str) -> Result<Handler> {
        if let Some(handler) = self.resolved.get(name) {
            return Ok(handler.clone());
        }
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| CompassError::ToolNotFound(name.to_string()))?;
        let handler = self.loader.load(&entry.locator)?;
        self.resolved.insert(name.to_string(), handler.clone());
        Ok(handler)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToolValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entry(name: &str, module: &str, symbol: &str) -> RegistryEntry {
        RegistryEntry {
            name: name.to_string(),
            locator: ToolLocator::new(module, symbol),
            description: String::new(),
            params: Vec::new(),
            internal: false,
        }
    }

    fn echo_loader() -> StaticLoader {
        let mut loader = StaticLoader::new();
        loader.register("compass::handlers::testing", "echo", |_ctx, args| {
            Ok(ToolOutcome::Value(ToolValue::from_json(
                serde_json::json!({ "result": args["text"] }),
            )))
        });
        loader
    }

    #[test]
    fn resolve_unknown_name_is_tool_not_found() {
        let mut reg = ToolRegistry::new(vec![], Box::new(StaticLoader::new())).unwrap();
        assert!(matches!(
            reg.resolve("bogus"),
            Err(CompassError::ToolNotFound(_))
        ));
    }

    #[test]
    fn resolve_missing_symbol_is_import_failure() {
        let entries = vec![entry("broken", "compass::handlers::missing", "nope")];
        let mut reg = ToolRegistry::new(entries, Box::new(echo_loader())).unwrap();
        match reg.resolve("broken") {
            Err(CompassError::ImportFailure { module, .. }) => {
                assert_eq!(module, "compass::handlers::missing");
            }
            Err(other) => panic!("expected ImportFailure, got {other:?}"),
            Ok(_) => panic!("expected ImportFailure, got a handler"),
        }
    }

    #[test]
    fn resolve_caches_after_first_success() {
        struct CountingLoader {
            loads: Arc<AtomicUsize>,
        }
        impl SymbolLoader for CountingLoader {
            fn load(&self, _locator: &ToolLocator) -> Result<Handler> {
                self.loads.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(|_ctx, _args| Ok(ToolOutcome::Value(ToolValue::Null))))
            }
        }

        let loads = Arc::new(AtomicUsize::new(0));
        let entries = vec![entry("counted", "m", "s")];
        let mut reg = ToolRegistry::new(
            entries,
            Box::new(CountingLoader {
                loads: loads.clone(),
            }),
        )
        .unwrap();

        reg.resolve("counted").unwrap();
        reg.resolve("counted").unwrap();
        reg.resolve("counted").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let entries = vec![entry("dup", "m", "a"), entry("dup", "m", "b")];
        assert!(matches!(
            ToolRegistry::new(entries, Box::new(StaticLoader::new())),
            Err(CompassError::ToolExists(_))
        ));
    }

    #[test]
    fn names_are_sorted() {
        let entries = vec![entry("zeta", "m", "z"), entry("alpha", "m", "a")];
        let reg = ToolRegistry::new(entries, Box::new(StaticLoader::new())).unwrap();
        assert_eq!(reg.names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }
}
