use std::path::Path;

use agile_vault::{type_label, DecryptedEntry, DisplayField, EngineConfig, ItemView};
use anyhow::{Context, Result};

use super::{format_date, open_session};
use crate::OutputFormat;

pub fn run(
    path: &Path,
    uuid: &str,
    password: &str,
    config: EngineConfig,
    format: OutputFormat,
) -> Result<()> {
    let mut session = open_session(path, config)?;
    session
        .unlock(password.as_bytes())
        .context("unlock failed")?;
    let entry = session
        .decrypt_entry(uuid)
        .with_context(|| format!("cannot read entry {uuid}"))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "entry": entry,
                "view": entry.view(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => print_plain(&entry),
    }

    session.lock();
    Ok(())
}

fn print_plain(entry: &DecryptedEntry) {
    println!("{}", entry.title);
    println!("  Type:     {}", type_label(&entry.type_name));
    if !entry.location.is_empty() {
        println!("  Location: {}", entry.location);
    }
    println!("  Created:  {}", format_date(entry.created_at));
    println!("  Updated:  {}", format_date(entry.updated_at));
    println!();

    match entry.view() {
        ItemView::Login(login) => {
            if let Some(username) = &login.username {
                row("Username", username);
            }
            if let Some(password) = &login.password {
                row("Password", password);
            }
            for url in &login.urls {
                row("URL", url);
            }
            for field in &login.other_fields {
                let label = if field.name.is_empty() {
                    &field.designation
                } else {
                    &field.name
                };
                row(label, &field.value);
            }
            notes(login.notes.as_deref());
        }
        ItemView::Password(view) => {
            row("Password", &view.password);
            notes(view.notes.as_deref());
        }
        ItemView::SecureNote(view) => {
            if view.notes.is_empty() {
                println!("(empty note)");
            } else {
                println!("{}", view.notes);
            }
        }
        ItemView::Generic(view) => {
            for DisplayField { label, value, .. } in &view.fields {
                row(label, value);
            }
            notes(view.notes.as_deref());
        }
        ItemView::Failed { reason } => println!("Could not decrypt: {reason}"),
    }
}

fn row(label: &str, value: &str) {
    println!("  {label:<10} {value}");
}

fn notes(text: Option<&str>) {
    if let Some(text) = text {
        println!();
        println!("Notes:");
        println!("{text}");
    }
}
