//! Phinx migration templating.
//!
//! Pure string composition: table names and DDL are only ever passed as
//! `format!` arguments, and are escaped for the PHP string literals and
//! MySQL identifiers they end up in.

/// Indentation inserted after every newline of a create statement.
pub const DDL_INDENT: &str = "            ";

/// Statement that disables foreign key checks for the duration of `up()`.
pub const DISABLE_FK_CHECKS: &str = "$this->execute('SET FOREIGN_KEY_CHECKS=0;');";

/// Statement that re-enables foreign key checks at the end of `up()`.
pub const ENABLE_FK_CHECKS: &str = "$this->execute('SET FOREIGN_KEY_CHECKS=1;');";

/// Insert `prefix` after every newline in `text`.
///
/// Single-line input comes back unchanged.
pub fn reindent(text: &str, prefix: &str) -> String {
    text.replace('\n', &format!("\n{}", prefix))
}

/// Escape text for embedding inside a PHP double-quoted string literal.
pub fn escape_php_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Make text safe for a single `//` comment line.
///
/// Line breaks would end the comment and `?>` would leave PHP mode.
fn sanitize_comment(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace("?>", "? >")
}

/// Render the drop-then-create statements for one table.
pub fn render_table_fragment(table: &str, create_statement: &str) -> String {
    let quoted = escape_php_double_quoted(&crate::db::quote_ident(table));
    let ddl = reindent(&escape_php_double_quoted(create_statement), DDL_INDENT);
    let label = sanitize_comment(table);

    format!(
        r#"
        // Drop table if it already exists
        $this->execute("DROP TABLE IF EXISTS {quoted};");

        // CREATE table string for table: "{label}"
        $this->execute("
            {ddl}
        ");
"#
    )
}

/// Wrap the per-table body in the migration class.
pub fn render_migration(class_name: &str, body: &str) -> String {
    format!(
        r#"<?php
use Phinx\Migration\AbstractMigration;
use Phinx\Db\Adapter\MysqlAdapter;

class {class_name} extends AbstractMigration
{{
    public function up()
    {{
        // disable foreign key checks to ensure all tables can be initially created
        {DISABLE_FK_CHECKS}
{body}
        // re-arm foreign key checks
        {ENABLE_FK_CHECKS}
    }}
}}
"#
    )
}
