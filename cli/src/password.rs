//! Master password acquisition.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use zeroize::Zeroizing;

/// Environment variable checked before stdin.
pub const PASSWORD_ENV: &str = "AGILE_VIEWER_PASSWORD";

/// Read the master password from [`PASSWORD_ENV`] or the first stdin line.
pub fn read_password() -> Result<Zeroizing<String>> {
    if let Some(value) = std::env::var_os(PASSWORD_ENV) {
        let value = value
            .into_string()
            .map_err(|_| anyhow::anyhow!("{PASSWORD_ENV} is not valid UTF-8"))?;
        return Ok(Zeroizing::new(value));
    }
    let stdin = std::io::stdin();
    first_line(&mut stdin.lock())
}

fn first_line(reader: &mut impl BufRead) -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    let read = reader
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    if read == 0 {
        bail!("no password given: set {PASSWORD_ENV} or pipe it on stdin");
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}
