use crate::output;
use compass_core::flow::{FlowEngine, ReferenceFilter};
use compass_core::paths;
use compass_core::store::GraphStore;
use compass_core::types::DirectiveCategory;
use std::path::Path;
use std::str::FromStr;

pub fn run(
    root: &Path,
    keyword: Option<&str>,
    category: Option<&str>,
    pattern: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let category = category.map(DirectiveCategory::from_str).transpose()?;

    let filter = ReferenceFilter {
        keyword: keyword.map(str::to_string),
        category,
        pattern: pattern.map(str::to_string),
    };

    let store = GraphStore::open(&paths::graph_db_path(root))?;
    let engine = FlowEngine::for_root(&store, root);
    let hits = engine.search_reference_consultations(&filter)?;

    if json {
        return output::print_json(&hits);
    }

    if hits.is_empty() {
        println!("no matching reference consultations");
        return Ok(());
    }

    output::reference_table(&hits);
    Ok(())
}
