//! CLI entry point for phinxgen.
//! Parses flags into config overrides, runs the generate pipeline once and
//! maps failures to exit codes.

mod output;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, CommandFactory, Parser};
use colored::Colorize;
use serde::Serialize;

use phinxgen_core::config::{CliOverrides, PhinxgenConfig};
use phinxgen_core::error::PhinxgenError;
use phinxgen_core::{GeneratedMigration, Phinxgen, TableOutcome};

/// Command-line flags. `-h` is taken by `--host`, so help is long-only.
#[derive(Parser)]
#[command(
    name = "phinxgen",
    about = "Generate an initial Phinx migration from a live MySQL schema",
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_HASH"), " ", env!("BUILD_TIME"), ")"
    ),
    disable_help_flag = true
)]
struct Cli {
    /// Database name
    #[arg(short = 'd', long, value_name = "NAME")]
    database: Option<String>,

    /// Database user
    #[arg(short = 'u', long, value_name = "USER")]
    user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, value_name = "PASSWORD")]
    password: Option<String>,

    /// Database host (default: localhost)
    #[arg(short = 'h', long, value_name = "HOST")]
    host: Option<String>,

    /// Database port (default: 3306)
    #[arg(short = 'P', long, value_name = "PORT")]
    port: Option<u16>,

    /// Migration class name (default: InitialMigration)
    #[arg(short = 'n', long, value_name = "CLASS")]
    class_name: Option<String>,

    /// Tables to leave out, comma-separated (default: phinxlog)
    #[arg(short = 's', long, value_name = "TABLES")]
    skip_tables: Option<String>,

    /// strftime pattern for the filename timestamp (default: %Y%m%d%H%M%S)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    date_format: Option<String>,

    /// Filename suffix after the timestamp (default: initial_migration.php)
    #[arg(short = 'o', long, value_name = "SUFFIX")]
    output_suffix: Option<String>,

    /// Config file path (default: phinxgen.toml)
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<String>,

    /// Directory the migration is written to (default: current directory)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Connection timeout in seconds (default: 10, 0 = no timeout)
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u32>,

    /// Emit tables in name order instead of database order
    #[arg(long, overrides_with = "no_sort_tables")]
    sort_tables: bool,

    /// Keep database order even if the config file sorts (overrides --sort-tables)
    #[arg(long = "no-sort-tables", hide = true, overrides_with = "sort_tables")]
    no_sort_tables: bool,

    /// Build the migration and show where it would go without writing it
    #[arg(long)]
    dry_run: bool,

    /// Print the migration to stdout instead of writing a file
    #[arg(long, conflicts_with_all = ["dry_run", "json"])]
    stdout: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose/debug output
    #[arg(short, long)]
    verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

/// JSON report for `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    class_name: &'a str,
    path: String,
    written: bool,
    tables: &'a [TableOutcome],
}

/// Where the finished migration goes.
enum Delivery {
    File,
    DryRun,
    Stdout,
}

impl Delivery {
    fn from_cli(cli: &Cli) -> Self {
        if cli.stdout {
            Delivery::Stdout
        } else if cli.dry_run {
            Delivery::DryRun
        } else {
            Delivery::File
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Set up logging (suppress when JSON output is requested)
    let filter = if cli.json {
        "error"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or(filter))
        .format_target(false)
        .format_timestamp(None)
        .init();

    match run(cli).await {
        Ok(()) => {}
        Err(PhinxgenError::UsageError { missing }) => {
            log::debug!("Missing required options; missing={}", missing);
            if let Err(e) = Cli::command().print_help() {
                eprintln!("{} {}", "ERROR:".red().bold(), e);
                process::exit(1);
            }
        }
        Err(e) => {
            print_error(&e);
            process::exit(exit_code(&e));
        }
    }
}

/// Map error types to differentiated exit codes.
fn exit_code(error: &PhinxgenError) -> i32 {
    match error {
        PhinxgenError::ConfigError(_) => 2,
        PhinxgenError::UsageError { .. } => 0,
        PhinxgenError::ConnectionError(_) => 3,
        PhinxgenError::QueryError { .. } => 4,
        PhinxgenError::OutputError { .. } => 5,
        _ => 1,
    }
}

fn overrides_from(cli: &Cli) -> CliOverrides {
    CliOverrides {
        database: cli.database.clone(),
        user: cli.user.clone(),
        password: cli.password.clone(),
        host: cli.host.clone(),
        port: cli.port,
        class_name: cli.class_name.clone(),
        skip_tables: cli.skip_tables.clone(),
        date_format: cli.date_format.clone(),
        output_suffix: cli.output_suffix.clone(),
        output_dir: cli.output_dir.clone(),
        connect_timeout: cli.connect_timeout,
        sort_tables: if cli.sort_tables {
            Some(true)
        } else if cli.no_sort_tables {
            Some(false)
        } else {
            None
        },
    }
}

/// Resolve configuration, build the migration and deliver it.
async fn run(cli: Cli) -> Result<(), PhinxgenError> {
    let overrides = overrides_from(&cli);
    let config = PhinxgenConfig::load(cli.config.as_deref(), &overrides)?;

    let missing = config.missing_required();
    if !missing.is_empty() {
        return Err(PhinxgenError::UsageError {
            missing: missing.join(", "),
        });
    }
    log::debug!("Resolved configuration; config={:?}", config);

    let mut generator = Phinxgen::new(config)?;
    let result = match generator.generate().await {
        Ok(migration) => deliver(&generator, &migration, &cli),
        Err(e) => Err(e),
    };

    // The run outcome wins over a failed disconnect
    if let Err(e) = generator.close().await {
        log::warn!("Failed to close connection; error={}", e);
    }
    result
}

/// Hand the finished migration to the chosen destination and report it.
fn deliver(
    generator: &Phinxgen,
    migration: &GeneratedMigration,
    cli: &Cli,
) -> Result<(), PhinxgenError> {
    let (path, written): (PathBuf, bool) = match Delivery::from_cli(cli) {
        Delivery::Stdout => {
            print!("{}", migration.content);
            return Ok(());
        }
        Delivery::DryRun => (generator.planned_output_path()?, false),
        Delivery::File => (generator.write(migration)?, true),
    };

    if cli.json {
        let report = JsonReport {
            class_name: &migration.class_name,
            path: path.display().to_string(),
            written,
            tables: &migration.tables,
        };
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
        return Ok(());
    }

    if !cli.quiet {
        output::print_table_summary(migration);
    }
    output::print_result(migration, &path, written);
    Ok(())
}

/// Print a formatted error message with actionable hints to stderr.
fn print_error(error: &PhinxgenError) {
    eprintln!("{} {}", "ERROR:".red().bold(), error);

    match error {
        PhinxgenError::ConfigError(_) => {
            eprintln!(
                "{}",
                "Hint: Check your phinxgen.toml or the --class-name, --date-format and --output-suffix flags."
                    .dimmed()
            );
        }
        PhinxgenError::ConnectionError(_) => {
            eprintln!(
                "{}",
                "Hint: Verify MySQL is running and --host, --port, --user and --password are correct."
                    .dimmed()
            );
        }
        PhinxgenError::QueryError { .. } => {
            eprintln!(
                "{}",
                "Hint: The user needs SELECT privileges on the database to read table definitions."
                    .dimmed()
            );
        }
        PhinxgenError::OutputError { .. } => {
            eprintln!(
                "{}",
                "Hint: Check that --output-dir exists and is writable, or use --stdout.".dimmed()
            );
        }
        _ => {}
    }
}
