use super::{domain, missing_arg};
use compass_core::error::Result;
use compass_core::paths;
use compass_core::registry::ToolContext;
use compass_core::state::ProjectState;
use compass_core::store::GraphStore;
use compass_core::value::{ToolOutcome, ToolValue};
use serde_json::{json, Value};

pub fn project_state(ctx: &ToolContext, _args: &Value) -> Result<ToolOutcome> {
    domain(
        ProjectState::load(&ctx.root)
            .and_then(|state| Ok(ToolValue::from_json(serde_json::to_value(&state)?))),
    )
}

pub fn set_active(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let Some(directive) = args.get("directive").and_then(Value::as_str) else {
        return missing_arg("directive");
    };

    // The directive must exist before it can become the implicit query root.
    let store = GraphStore::open(&paths::graph_db_path(&ctx.root))?;
    if let Err(e) = store.get_directive(directive) {
        return domain(Err(e));
    }

    domain((|| {
        let mut state = ProjectState::load(&ctx.root)?;
        state.set_active(directive);
        state.save(&ctx.root)?;
        Ok(ToolValue::from_json(json!({
            "success": true,
            "active_directive": directive,
        })))
    })())
}

pub fn observe_condition(ctx: &ToolContext, args: &Value) -> Result<ToolOutcome> {
    let Some(condition) = args.get("condition").and_then(Value::as_str) else {
        return missing_arg("condition");
    };

    domain((|| {
        let mut state = ProjectState::load(&ctx.root)?;
        state.observe_condition(condition);
        state.save(&ctx.root)?;
        Ok(ToolValue::from_json(json!({
            "success": true,
            "conditions": state.conditions,
        })))
    })())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use compass_core::directive::Directive;
    use compass_core::types::DirectiveCategory;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> ToolContext {
        let store = GraphStore::open(&paths::graph_db_path(dir.path())).unwrap();
        store
            .insert_directive(&Directive::new(
                "plan-tasks",
                DirectiveCategory::Orchestration,
            ))
            .unwrap();
        ProjectState::new("test").save(dir.path()).unwrap();
        ToolContext::new(dir.path())
    }

    #[test]
    fn set_active_then_read_state() {
        let dir = TempDir::new().unwrap();
        let ctx = setup(&dir);

        let v = set_active(&ctx, &json!({"directive": "plan-tasks"}))
            .unwrap()
            .to_json();
        assert_eq!(v["success"], true);

        let state = project_state(&ctx, &json!({})).unwrap().to_json();
        assert_eq!(state["active_directive"], "plan-tasks");
    }

    #[test]
    fn set_active_unknown_directive_fails_structurally() {
        let dir = TempDir::new().unwrap();
        let ctx = setup(&dir);
        let v = set_active(&ctx, &json!({"directive": "ghost"}))
            .unwrap()
            .to_json();
        assert_eq!(v["success"], false);
    }

    #[test]
    fn observe_condition_accumulates() {
        let dir = TempDir::new().unwrap();
        let ctx = setup(&dir);

        observe_condition(&ctx, &json!({"condition": "test_failure"})).unwrap();
        let v = observe_condition(&ctx, &json!({"condition": "user_correction"}))
            .unwrap()
            .to_json();
        assert_eq!(v["conditions"], json!(["test_failure", "user_correction"]));
    }

    #[test]
    fn uninitialized_project_is_domain_failure() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        let v = project_state(&ctx, &json!({})).unwrap().to_json();
        assert_eq!(v["success"], false);
        assert!(v["error"].as_str().unwrap().contains("not initialized"));
    }
}
