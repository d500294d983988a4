//! Terminal output for the generate run.
//! Uses comfy-table for the per-table summary and colored for status styling.

use std::path::Path;

use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use phinxgen_core::{GeneratedMigration, TableStatus};

/// Format the per-table outcomes as a colored table.
pub fn print_table_summary(migration: &GeneratedMigration) {
    if migration.tables.is_empty() {
        println!("{}", "No base tables found.".yellow());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#"),
            Cell::new("Table"),
            Cell::new("Status"),
            Cell::new("DDL Lines"),
        ]);

    for (index, outcome) in migration.tables.iter().enumerate() {
        let lines = match outcome.status {
            TableStatus::Included => outcome.ddl_lines.to_string(),
            TableStatus::Skipped => String::new(),
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&outcome.name),
            Cell::new(format_status(&outcome.status)),
            Cell::new(lines),
        ]);
    }

    println!("{table}");
}

/// Return a colored string representation of a table status.
fn format_status(status: &TableStatus) -> String {
    match status {
        TableStatus::Included => "Included".green().to_string(),
        TableStatus::Skipped => "Skipped".dimmed().to_string(),
    }
}

/// Print where the migration went, or would go on a dry run.
pub fn print_result(migration: &GeneratedMigration, path: &Path, written: bool) {
    let included = migration.included().count();
    let skipped = migration.skipped().count();

    if written {
        println!(
            "{}",
            format!(
                "Wrote {} with {} table(s) ({} skipped)",
                migration.class_name, included, skipped
            )
            .green()
            .bold()
        );
        println!("  {} {}", "→".green(), path.display());
    } else {
        println!(
            "{}",
            format!(
                "Dry run: {} would contain {} table(s) ({} skipped)",
                migration.class_name, included, skipped
            )
            .yellow()
        );
        println!("  {} {}", "→".yellow(), path.display());
    }
}
