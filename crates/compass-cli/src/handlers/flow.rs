use super::{domain, missing_arg};
use compass_core::error::Result;
use compass_core::flow::{FlowEngine, ReferenceFilter};
use compass_core::paths;
use compass_core::registry::ToolContext;
use compass_core::store::GraphStore;
use compass_core::types::DirectiveCategory;
use compass_core::value::{ToolOutcome, ToolValue};
use serde_json::Value;
use std::str::FromStr;

fn open_store(ctx: &ToolContext) -> Result<GraphStore> {
    GraphStore::open(&paths::graph_db_path(&ctx.root))
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

// ---------------------------------------------------------------------------
// Graph reads
// ---------------------------------------------------------------------------

pub fn get_directive(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let Some(name) = opt_str(args, "name") else {
        return missing_arg("name");
    };
    let store = open_store(ctx)?;
    domain(
        store
            .get_directive(name)
            .and_then(|d| Ok(ToolValue::from_json(serde_json::to_value(&d)?))),
    )
}

pub fn list_directives(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let category = match opt_str(args, "category") {
        Some(raw) => match DirectiveCategory::from_str(raw) {
            Ok(c) => Some(c),
            Err(e) => return Ok(ToolOutcome::failure(e.to_string())),
        },
        None => None,
    };
    let store = open_store(ctx)?;
    let mut directives = store.list_directives()?;
    if let Some(category) = category {
        directives.retain(|d| d.category == category);
    }
    domain(Ok(ToolValue::from_json(serde_json::to_value(&directives)?)))
}

// ---------------------------------------------------------------------------
// Flow queries
// ---------------------------------------------------------------------------

pub fn next_steps(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let store = open_store(ctx)?;
    let engine = FlowEngine::for_root(&store, &ctx.root);
    domain(
        engine
            .next_sequential_steps(opt_str(args, "directive"))
            .and_then(|edges| Ok(ToolValue::from_json(serde_json::to_value(&edges)?))),
    )
}

pub fn conditional_paths(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let store = open_store(ctx)?;
    let engine = FlowEngine::for_root(&store, &ctx.root);
    domain(
        engine
            .conditional_paths(opt_str(args, "directive"))
            .and_then(|edges| Ok(ToolValue::from_json(serde_json::to_value(&edges)?))),
    )
}

pub fn search_references(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let category = match opt_str(args, "category") {
        Some(raw) => match DirectiveCategory::from_str(raw) {
            Ok(c) => Some(c),
            Err(e) => return Ok(ToolOutcome::failure(e.to_string())),
        },
        None => None,
    };
    let filter = ReferenceFilter {
        keyword: opt_str(args, "keyword").map(str::to_string),
        category,
        pattern: opt_str(args, "pattern").map(str::to_string),
    };
    let store = open_store(ctx)?;
    let engine = FlowEngine::for_root(&store, &ctx.root);
    domain(
        engine
            .search_reference_consultations(&filter)
            .and_then(|hits| Ok(ToolValue::from_json(serde_json::to_value(&hits)?))),
    )
}

pub fn contextual_utilities(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let store = open_store(ctx)?;
    let engine = FlowEngine::for_root(&store, &ctx.root);
    domain(
        engine
            .contextual_utilities(opt_str(args, "directive"), opt_str(args, "condition"))
            .and_then(|edges| Ok(ToolValue::from_json(serde_json::to_value(&edges)?))),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
