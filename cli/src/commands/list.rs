use std::path::Path;

use agile_vault::{category_counts, search, type_label, EngineConfig};
use anyhow::Result;

use super::{format_date, open_session};
use crate::OutputFormat;

pub fn run(
    path: &Path,
    query: Option<&str>,
    config: EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(path, config)?;
    let found = search(session.index(), query.unwrap_or_default());

    match format {
        OutputFormat::Json => {
            let counts: serde_json::Map<String, serde_json::Value> =
                category_counts(session.index())
                    .into_iter()
                    .map(|(category, n)| (category.as_str().to_string(), n.into()))
                    .collect();
            let output = serde_json::json!({
                "name": session.name(),
                "itemCount": session.item_count(),
                "categories": counts,
                "items": found,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{} ({} items)", session.name(), session.item_count());
            if found.is_empty() {
                match query {
                    Some(q) => println!("  (no items match \"{q}\")"),
                    None => println!("  (no items)"),
                }
            }
            for entry in &found {
                println!(
                    "  {}  {:<16} {}  {}",
                    entry.uuid,
                    type_label(&entry.type_name),
                    format_date(entry.updated_at),
                    entry.title,
                );
            }
        }
    }

    Ok(())
}
