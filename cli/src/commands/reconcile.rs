use std::path::Path;

use agile_vault::{reconcile, EngineConfig};
use anyhow::Result;

use super::open_session;
use crate::OutputFormat;

pub fn run(path: &Path, config: EngineConfig, format: OutputFormat) -> Result<()> {
    let session = open_session(path, config)?;
    let report = reconcile(session.index(), &session.list_entry_ids()?);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            if report.is_consistent() {
                println!("{}: index and entry files agree", session.name());
            }
            for uuid in &report.missing_files {
                println!("  missing file   {uuid}");
            }
            for uuid in &report.unindexed_files {
                println!("  not in index   {uuid}");
            }
        }
    }

    Ok(())
}
