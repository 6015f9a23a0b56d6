//! Shared presentation: headings, tree listings and configuration output.

use crate::config::WoodConfig;
use crate::error::ApiError;
use crate::tree::Tree;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{CellAlignment, Table};
use owo_colors::OwoColorize;
use serde_json::Value;

const SECRET_KEYS: &[&str] = &["api_token", "api_key"];

/// Format a section heading with bold and underline styling.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_tree_text(tree: &Tree) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Tree")));
    if tree.is_empty() {
        out.push_str("  No files.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "Fingerprint", "Size"]);
    for entry in tree {
        table.add_row(vec![
            entry.path().to_string(),
            entry.fingerprint_hex(),
            entry.size().to_string(),
        ]);
    }
    if let Some(column) = table.column_mut(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\n\n  Files: {}\n  Total size: {} bytes\n",
        tree.len(),
        tree.total_size()
    ));
    out
}

pub fn format_tree_json(tree: &Tree) -> Result<String, ApiError> {
    let entries: Vec<Value> = tree
        .iter()
        .map(|entry| {
            serde_json::json!({
                "path": entry.path(),
                "fingerprint": entry.fingerprint_hex(),
                "size": entry.size(),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Merged configuration with credentials masked
pub fn format_config(config: &WoodConfig, format: &str) -> Result<String, ApiError> {
    let mut value = serde_json::to_value(config)?;
    redact_secrets(&mut value);
    if format == "json" {
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    Ok(format!(
        "{}\n\n{}",
        format_section_heading("Configuration"),
        serde_json::to_string_pretty(&value)?
    ))
}

fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) && !inner.is_null() {
                    *inner = Value::String("********".to_string());
                } else {
                    redact_secrets(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}
