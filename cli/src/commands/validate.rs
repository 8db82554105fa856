use std::path::Path;

use anyhow::Result;

use crate::OutputFormat;

pub fn run(path: &Path, format: OutputFormat) -> Result<()> {
    let verdict = agile_vault::check_directory(path);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "path": path.to_string_lossy(),
                "valid": verdict.is_ok(),
                "reason": verdict.as_ref().err().map(ToString::to_string),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match &verdict {
            Ok(()) => println!("{}: valid keychain", path.display()),
            Err(issue) => println!("{}: invalid ({issue})", path.display()),
        },
    }

    if verdict.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
