use crate::output;
use compass_core::state::ProjectState;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = ProjectState::load(root)?;

    if json {
        return output::print_json(&state);
    }

    println!("project:          {}", state.project);
    println!(
        "active directive: {}",
        state.active_directive.as_deref().unwrap_or("(none)")
    );
    println!(
        "conditions:       {}",
        if state.conditions.is_empty() {
            "(none)".to_string()
        } else {
            state.conditions.join(", ")
        }
    );
    if let Some(last) = state.last_consultation() {
        println!(
            "last consulted:   {} at {}",
            last.directive,
            last.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
