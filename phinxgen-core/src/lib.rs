//! Generate an initial Phinx migration from a live MySQL schema.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use phinxgen_core::config::{CliOverrides, PhinxgenConfig};
//! use phinxgen_core::Phinxgen;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PhinxgenConfig::load(None, &CliOverrides::default())?;
//! let mut generator = Phinxgen::new(config)?;
//! let migration = generator.generate().await?;
//! let path = generator.write(&migration)?;
//! generator.close().await?;
//! println!("Wrote {}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration loading (TOML, CLI overrides, defaults)
//! - [`db`]: MySQL connection setup and identifier quoting
//! - [`schema`]: Table listing and `SHOW CREATE TABLE` via [`schema::SchemaSource`]
//! - [`template`]: Per-table fragments and the migration class template
//! - [`commands`]: The generate pipeline
//! - [`writer`]: Timestamped output filename and file writing
//! - [`error`]: Error types

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod template;
pub mod writer;

use std::path::PathBuf;

use config::PhinxgenConfig;
use error::Result;
use schema::SchemaReader;

pub use commands::generate::{GeneratedMigration, TableOutcome, TableStatus};
pub use config::CliOverrides;
pub use error::PhinxgenError;

/// Main entry point for the phinxgen library.
///
/// Owns the resolved configuration and the schema reader. The database
/// connection is opened by the first query and released by [`Phinxgen::close`].
pub struct Phinxgen {
    pub config: PhinxgenConfig,
    reader: SchemaReader,
}

impl Phinxgen {
    /// Create a new instance. No connection is made until [`Phinxgen::generate`].
    pub fn new(config: PhinxgenConfig) -> Result<Self> {
        let reader = SchemaReader::new(&config.database)?;
        Ok(Self { config, reader })
    }

    /// Read the schema and build the migration source.
    pub async fn generate(&mut self) -> Result<GeneratedMigration> {
        commands::generate::execute(&mut self.reader, &self.config.generator).await
    }

    /// Write a generated migration to its timestamped path.
    pub fn write(&self, migration: &GeneratedMigration) -> Result<PathBuf> {
        writer::write(&self.config.generator, &migration.content)
    }

    /// Where [`Phinxgen::write`] would put the file right now.
    pub fn planned_output_path(&self) -> Result<PathBuf> {
        writer::output_path(&self.config.generator, &chrono::Local::now())
    }

    /// Release the database connection, if one was opened.
    pub async fn close(self) -> Result<()> {
        self.reader.close().await
    }
}
