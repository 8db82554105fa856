pub mod list;
pub mod reconcile;
pub mod show;
pub mod validate;

use std::path::Path;

use agile_vault::{EngineConfig, VaultSession};
use anyhow::{Context, Result};

/// Open a session, adding the path to any error.
fn open_session(path: &Path, config: EngineConfig) -> Result<VaultSession> {
    VaultSession::open(path, config)
        .with_context(|| format!("cannot open vault {}", path.display()))
}

/// Format a Unix timestamp as `YYYY-MM-DD` (UTC), or `unknown` for zero.
fn format_date(timestamp: i64) -> String {
    if timestamp == 0 {
        return "unknown".into();
    }
    let days = timestamp.div_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
#[allow(clippy::arithmetic_side_effects)]
const fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
