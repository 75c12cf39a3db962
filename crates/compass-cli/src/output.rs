//! Human and JSON output for the CLI commands. Each table renderer knows
//! its domain row shape; the column layout lives here, not in the commands.

use compass_core::edge::FlowEdge;
use compass_core::flow::ReferenceHit;
use compass_core::registry::RegistryEntry;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn tool_table(entries: &[RegistryEntry]) {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let params: Vec<&str> = e.params.iter().map(|p| p.name.as_str()).collect();
            vec![e.name.clone(), params.join(", "), e.description.clone()]
        })
        .collect();
    print!(
        "{}",
        render_table(&["TOOL", "PARAMS", "DESCRIPTION"], &rows)
    );
}

pub fn edge_table(edges: &[FlowEdge]) {
    let rows: Vec<Vec<String>> = edges
        .iter()
        .map(|e| {
            vec![
                e.target.clone(),
                e.flow_type.to_string(),
                e.condition.clone().unwrap_or_default(),
                e.description.clone(),
            ]
        })
        .collect();
    print!(
        "{}",
        render_table(&["TARGET", "FLOW", "CONDITION", "DESCRIPTION"], &rows)
    );
}

pub fn reference_table(hits: &[ReferenceHit]) {
    let rows: Vec<Vec<String>> = hits
        .iter()
        .map(|h| {
            vec![
                h.target.name.clone(),
                h.target.keywords.join(", "),
                h.target.description.clone(),
            ]
        })
        .collect();
    print!(
        "{}",
        render_table(&["REFERENCE", "KEYWORDS", "DESCRIPTION"], &rows)
    );
}

/// Columns are sized to the widest cell; trailing padding is trimmed so the
/// last column never drags whitespace. Every row carries exactly one cell
/// per header (the renderers above guarantee it).
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&sep.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let rendered: Vec<String> = widths
        .iter()
        .zip(cells)
        .map(|(&w, cell)| format!("{cell:<w$}"))
        .collect();
    rendered.join("  ").trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
