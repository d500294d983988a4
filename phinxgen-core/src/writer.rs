//! Timestamped output file naming and writing.

use std::fmt::Write;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone, Utc};

use crate::config::GeneratorSettings;
use crate::error::{PhinxgenError, Result};

fn invalid_date_format(date_format: &str) -> PhinxgenError {
    PhinxgenError::ConfigError(format!(
        "Invalid date format '{}'. Use a strftime pattern such as '%Y%m%d%H%M%S'.",
        date_format
    ))
}

/// Format `now` with `date_format`.
///
/// Some specifiers parse but cannot be rendered (`%#z` is parse-only); those
/// surface as a `ConfigError` instead of a formatting panic.
fn render_stamp<Tz>(now: &DateTime<Tz>, date_format: &str) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut stamp = String::new();
    write!(stamp, "{}", now.format(date_format)).map_err(|_| invalid_date_format(date_format))?;
    Ok(stamp)
}

/// Reject strftime patterns chrono cannot parse or render.
pub fn validate_date_format(date_format: &str) -> Result<()> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid_date_format(date_format));
    }
    render_stamp(&DateTime::<Utc>::UNIX_EPOCH, date_format)?;
    Ok(())
}

/// Build `<formatted now>_<suffix>`.
pub fn output_filename<Tz>(now: &DateTime<Tz>, date_format: &str, suffix: &str) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    validate_date_format(date_format)?;
    let stamp = render_stamp(now, date_format)?;
    if stamp.contains('/') || stamp.contains('\\') {
        return Err(PhinxgenError::ConfigError(format!(
            "Date format '{}' produces a path separator ('{}')",
            date_format, stamp
        )));
    }
    Ok(format!("{}_{}", stamp, suffix))
}

/// Full path the migration would be written to at `now`.
pub fn output_path<Tz>(settings: &GeneratorSettings, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let filename = output_filename(now, &settings.date_format, &settings.output_suffix)?;
    Ok(settings.output_dir.join(filename))
}

/// Write `content` to the timestamped path, creating or truncating the file.
pub fn write(settings: &GeneratorSettings, content: &str) -> Result<PathBuf> {
    let path = output_path(settings, &Local::now())?;
    std::fs::write(&path, content).map_err(|source| PhinxgenError::OutputError {
        path: path.display().to_string(),
        source,
    })?;
    log::info!(
        "Wrote migration; path={}, bytes={}",
        path.display(),
        content.len()
    );
    Ok(path)
}
