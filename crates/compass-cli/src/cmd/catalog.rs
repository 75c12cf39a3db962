use crate::output;
use compass_core::paths;
use compass_core::schema;
use compass_core::store::GraphStore;
use serde_json::json;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = GraphStore::open(&paths::graph_db_path(root))?;
    let entries = store.load_tool_entries()?;

    if json {
        let tools: Vec<_> = entries
            .iter()
            .filter(|e| !e.internal)
            .map(|e| {
                json!({
                    "name": e.name,
                    "description": e.description,
                    "inputSchema": schema::input_schema(&e.params),
                })
            })
            .collect();
        return output::print_json(&tools);
    }

    let external: Vec<_> = entries.into_iter().filter(|e| !e.internal).collect();
    output::tool_table(&external);
    Ok(())
}
