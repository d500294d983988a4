//! Configuration loading and resolution.
//!
//! Supports an optional TOML config file and CLI overrides with a defined
//! priority order (CLI > TOML > defaults). Absent or empty values fall back
//! to the layer below.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;

use crate::error::{PhinxgenError, Result};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "phinxgen.toml";

/// Table skipped when no explicit skip-list is configured (Phinx's own bookkeeping table).
pub const DEFAULT_SKIP_TABLE: &str = "phinxlog";

static PHP_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Helper macro to apply an optional owned value directly to a target field.
///
/// Replaces: `if let Some(v) = $opt { $target = v; }`
macro_rules! apply_option {
    ($opt:expr => $target:expr) => {
        if let Some(v) = $opt {
            $target = v;
        }
    };
}

/// Like `apply_option!`, wrapping the value in `Some()`.
macro_rules! apply_option_some {
    ($opt:expr => $target:expr) => {
        if let Some(v) = $opt {
            $target = Some(v);
        }
    };
}

/// Helper macro for string options: empty strings count as absent.
macro_rules! apply_non_empty {
    ($opt:expr => $target:expr) => {
        if let Some(v) = non_empty($opt) {
            $target = v;
        }
    };
}

/// Like `apply_non_empty!`, wrapping the value in `Some()`.
macro_rules! apply_non_empty_some {
    ($opt:expr => $target:expr) => {
        if let Some(v) = non_empty($opt) {
            $target = Some(v);
        }
    };
}

/// Top-level configuration for phinxgen.
#[derive(Debug, Clone, Default)]
pub struct PhinxgenConfig {
    /// Source database connection settings.
    pub database: DatabaseConfig,
    /// Migration generation settings.
    pub generator: GeneratorSettings,
}

/// Database connection configuration.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Database (schema) name to inspect.
    pub name: Option<String>,
    /// Database user for authentication.
    pub user: Option<String>,
    /// Database password for authentication.
    pub password: Option<String>,
    /// Database server hostname.
    pub host: String,
    /// Database server port number.
    pub port: u16,
    /// Connection timeout in seconds (0 means no timeout).
    pub connect_timeout_secs: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: None,
            user: None,
            password: None,
            host: "localhost".to_string(),
            port: 3306,
            connect_timeout_secs: 10,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Settings that shape the generated migration file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Name of the generated migration class.
    pub class_name: String,
    /// Tables that never appear in the generated migration.
    pub skip_tables: BTreeSet<String>,
    /// chrono strftime pattern for the filename timestamp.
    pub date_format: String,
    /// Text appended after `<timestamp>_` in the output filename.
    pub output_suffix: String,
    /// Directory the migration file is written into.
    pub output_dir: PathBuf,
    /// Sort table names instead of keeping the database's order.
    pub sort_tables: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            class_name: "InitialMigration".to_string(),
            skip_tables: BTreeSet::from([DEFAULT_SKIP_TABLE.to_string()]),
            date_format: "%Y%m%d%H%M%S".to_string(),
            output_suffix: "initial_migration.php".to_string(),
            output_dir: PathBuf::from("."),
            sort_tables: false,
        }
    }
}

// ── TOML deserialization structs ──

#[derive(Deserialize, Default)]
struct TomlConfig {
    database: Option<TomlDatabaseConfig>,
    generator: Option<TomlGeneratorSettings>,
}

#[derive(Deserialize, Default)]
struct TomlDatabaseConfig {
    name: Option<String>,
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    connect_timeout: Option<u32>,
}

#[derive(Deserialize, Default)]
struct TomlGeneratorSettings {
    class_name: Option<String>,
    skip_tables: Option<Vec<String>>,
    date_format: Option<String>,
    output_suffix: Option<String>,
    output_dir: Option<String>,
    sort_tables: Option<bool>,
}

/// CLI overrides that take highest priority.
///
/// String values are raw: an empty string is treated as not given, except
/// for the password, where it means "no password".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the database name.
    pub database: Option<String>,
    /// Override the database user.
    pub user: Option<String>,
    /// Override the database password.
    pub password: Option<String>,
    /// Override the database host.
    pub host: Option<String>,
    /// Override the database port.
    pub port: Option<u16>,
    /// Override the migration class name.
    pub class_name: Option<String>,
    /// Override the skip-list (comma-separated).
    pub skip_tables: Option<String>,
    /// Override the filename date format.
    pub date_format: Option<String>,
    /// Override the output filename suffix.
    pub output_suffix: Option<String>,
    /// Override the output directory.
    pub output_dir: Option<String>,
    /// Override the connection timeout in seconds.
    pub connect_timeout: Option<u32>,
    /// Override whether table names are sorted.
    pub sort_tables: Option<bool>,
}

impl PhinxgenConfig {
    /// Merge CLI overrides over the built-in defaults.
    ///
    /// Never fails: values that are absent or empty keep their default.
    /// Required-option checks are left to the caller (see [`missing_required`]).
    ///
    /// [`missing_required`]: PhinxgenConfig::missing_required
    pub fn resolve(overrides: &CliOverrides) -> Self {
        let mut config = PhinxgenConfig::default();
        config.apply_cli(overrides);
        config
    }

    /// Load configuration with the following priority (highest wins):
    /// 1. CLI arguments
    /// 2. TOML config file
    /// 3. Built-in defaults
    pub fn load(config_path: Option<&str>, overrides: &CliOverrides) -> Result<Self> {
        let mut config = PhinxgenConfig::default();

        let toml_path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);
        if let Some(content) = read_config_file(toml_path, config_path.is_some())? {
            // The file may hold a password
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(meta) = std::fs::metadata(toml_path) {
                    let mode = meta.permissions().mode();
                    if mode & 0o077 != 0 {
                        log::warn!(
                            "Config file is readable by others, consider chmod 600; path={}, mode={:o}",
                            toml_path,
                            mode & 0o777
                        );
                    }
                }
            }
            let toml_config: TomlConfig = toml::from_str(&content).map_err(|e| {
                PhinxgenError::ConfigError(format!(
                    "Failed to parse config file '{}': {}",
                    toml_path, e
                ))
            })?;
            config.apply_toml(toml_config);
            log::debug!("Loaded config file; path={}", toml_path);
        }

        config.apply_cli(overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_toml(&mut self, toml: TomlConfig) {
        if let Some(db) = toml.database {
            apply_non_empty_some!(db.name => self.database.name);
            apply_non_empty_some!(db.user => self.database.user);
            // An empty password is a real value for accounts without one
            apply_option_some!(db.password => self.database.password);
            apply_non_empty!(db.host => self.database.host);
            apply_option!(db.port => self.database.port);
            apply_option!(db.connect_timeout => self.database.connect_timeout_secs);
        }

        if let Some(g) = toml.generator {
            apply_non_empty!(g.class_name => self.generator.class_name);
            if let Some(tables) = g.skip_tables {
                self.generator.skip_tables = tables
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            apply_non_empty!(g.date_format => self.generator.date_format);
            apply_non_empty!(g.output_suffix => self.generator.output_suffix);
            if let Some(dir) = non_empty(g.output_dir) {
                self.generator.output_dir = PathBuf::from(dir);
            }
            apply_option!(g.sort_tables => self.generator.sort_tables);
        }
    }

    fn apply_cli(&mut self, overrides: &CliOverrides) {
        apply_non_empty_some!(overrides.database.clone() => self.database.name);
        apply_non_empty_some!(overrides.user.clone() => self.database.user);
        apply_option_some!(overrides.password.clone() => self.database.password);
        apply_non_empty!(overrides.host.clone() => self.database.host);
        apply_option!(overrides.port => self.database.port);
        apply_option!(overrides.connect_timeout => self.database.connect_timeout_secs);
        apply_non_empty!(overrides.class_name.clone() => self.generator.class_name);
        if let Some(list) = non_empty(overrides.skip_tables.clone()) {
            self.generator.skip_tables = parse_skip_list(&list);
        }
        apply_non_empty!(overrides.date_format.clone() => self.generator.date_format);
        apply_non_empty!(overrides.output_suffix.clone() => self.generator.output_suffix);
        if let Some(dir) = non_empty(overrides.output_dir.clone()) {
            self.generator.output_dir = PathBuf::from(dir);
        }
        apply_option!(overrides.sort_tables => self.generator.sort_tables);
    }

    /// Names of required options that are still missing after merging.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.database.name.is_none() {
            missing.push("database");
        }
        if self.database.user.is_none() {
            missing.push("user");
        }
        if self.database.password.is_none() {
            missing.push("password");
        }
        missing
    }

    /// Check values that would otherwise surface as broken output.
    pub fn validate(&self) -> Result<()> {
        validate_class_name(&self.generator.class_name)?;
        crate::writer::validate_date_format(&self.generator.date_format)?;
        validate_output_suffix(&self.generator.output_suffix)?;
        Ok(())
    }
}

/// Split a comma-separated skip-list into a set of trimmed, non-empty names.
pub fn parse_skip_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensure the class name is a valid PHP class identifier.
pub fn validate_class_name(name: &str) -> Result<()> {
    if !PHP_IDENT_RE.is_match(name) {
        return Err(PhinxgenError::ConfigError(format!(
            "Class name '{}' is not a valid PHP identifier. Use letters, digits and '_' only, not starting with a digit.",
            name
        )));
    }
    Ok(())
}

fn validate_output_suffix(suffix: &str) -> Result<()> {
    if suffix.contains('/') || suffix.contains('\\') {
        return Err(PhinxgenError::ConfigError(format!(
            "Output suffix '{}' must not contain a path separator. Use --output-dir instead.",
            suffix
        )));
    }
    Ok(())
}

/// Read the config file; a missing default file is not an error.
fn read_config_file(path: &str, explicit: bool) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PhinxgenError::ConfigError(
            format!("Config file '{}' not found", path),
        )),
        Err(e) => Err(PhinxgenError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path, e
        ))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
