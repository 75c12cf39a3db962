use crate::output;
use compass_core::flow::FlowEngine;
use compass_core::paths;
use compass_core::store::GraphStore;
use std::path::Path;

pub fn run(
    root: &Path,
    directive: Option<&str>,
    conditional: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = GraphStore::open(&paths::graph_db_path(root))?;
    let engine = FlowEngine::for_root(&store, root);

    let edges = if conditional {
        engine.conditional_paths(directive)?
    } else {
        engine.next_sequential_steps(directive)?
    };

    if json {
        return output::print_json(&edges);
    }

    if edges.is_empty() {
        println!("no {} edges", if conditional { "conditional" } else { "sequential" });
        return Ok(());
    }

    output::edge_table(&edges);
    Ok(())
}
