//! Build the initial migration from the live schema.
//!
//! Lists tables, drops the skip-listed ones, fetches DDL for the rest and
//! renders everything into one migration class. Any reader failure aborts
//! the build before anything is written.

use serde::Serialize;

use crate::config::GeneratorSettings;
use crate::error::Result;
use crate::schema::SchemaSource;
use crate::template;

/// What happened to a single table during generation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum TableStatus {
    /// Drop and create statements were emitted.
    Included,
    /// The table is on the skip-list and was not queried.
    Skipped,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Included => write!(f, "included"),
            TableStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-table result, in iteration order.
#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    /// Table name as reported by the database.
    pub name: String,
    /// Whether the table made it into the migration.
    pub status: TableStatus,
    /// Number of lines in the fetched create statement (0 when skipped).
    pub ddl_lines: usize,
}

/// The finished migration source, ready to be written once.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedMigration {
    /// Class name used in the generated file.
    pub class_name: String,
    /// Complete PHP source text.
    #[serde(skip)]
    pub content: String,
    /// Every listed table with its outcome.
    pub tables: Vec<TableOutcome>,
}

impl GeneratedMigration {
    /// Tables whose statements are in the migration.
    pub fn included(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables
            .iter()
            .filter(|t| t.status == TableStatus::Included)
    }

    /// Tables left out because of the skip-list.
    pub fn skipped(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables
            .iter()
            .filter(|t| t.status == TableStatus::Skipped)
    }
}

/// Execute the generate command against any schema source.
pub async fn execute<S: SchemaSource>(
    source: &mut S,
    settings: &GeneratorSettings,
) -> Result<GeneratedMigration> {
    let mut table_names = source.list_tables().await?;
    if settings.sort_tables {
        table_names.sort();
    }
    log::info!("Found tables; count={}", table_names.len());

    let total = table_names.len();
    let mut body = String::new();
    let mut tables = Vec::with_capacity(total);

    for (index, name) in table_names.into_iter().enumerate() {
        if settings.skip_tables.contains(&name) {
            log::info!(
                "Skipping table; table={}, progress={}/{}",
                name,
                index + 1,
                total
            );
            tables.push(TableOutcome {
                name,
                status: TableStatus::Skipped,
                ddl_lines: 0,
            });
            continue;
        }

        log::info!(
            "Processing table; table={}, progress={}/{}",
            name,
            index + 1,
            total
        );
        let ddl = source.create_statement(&name).await?;
        body.push_str(&template::render_table_fragment(&name, &ddl));
        tables.push(TableOutcome {
            name,
            status: TableStatus::Included,
            ddl_lines: ddl.lines().count(),
        });
    }

    let content = template::render_migration(&settings.class_name, &body);

    Ok(GeneratedMigration {
        class_name: settings.class_name.clone(),
        content,
        tables,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use super::*;
    use crate::error::PhinxgenError;

    /// In-memory schema that records which tables were asked for.
    struct FakeSchema {
        tables: Vec<String>,
        ddl: HashMap<String, String>,
        requested: Vec<String>,
        fail_on: Option<String>,
    }

    impl FakeSchema {
        fn new(tables: &[&str]) -> Self {
            Self {
                tables: tables.iter().map(|t| t.to_string()).collect(),
                ddl: tables
                    .iter()
                    .map(|t| {
                        (
                            t.to_string(),
                            format!("CREATE TABLE `{t}` (\n  `id` int NOT NULL\n) ENGINE=InnoDB"),
                        )
                    })
                    .collect(),
                requested: Vec::new(),
                fail_on: None,
            }
        }
    }

    impl SchemaSource for FakeSchema {
        async fn list_tables(&mut self) -> Result<Vec<String>> {
            Ok(self.tables.clone())
        }

        async fn create_statement(&mut self, table: &str) -> Result<String> {
            self.requested.push(table.to_string());
            if self.fail_on.as_deref() == Some(table) {
                return Err(PhinxgenError::QueryError {
                    query: format!("SHOW CREATE TABLE `{}`", table),
                    code: Some(1146),
                    message: "Table doesn't exist".to_string(),
                });
            }
            Ok(self.ddl[table].clone())
        }
    }

    #[tokio::test]
    async fn test_skips_phinxlog_and_keeps_order() {
        let mut schema = FakeSchema::new(&["users", "phinxlog", "orders"]);
        let migration = execute(&mut schema, &GeneratorSettings::default())
            .await
            .unwrap();

        let users = migration.content.find("DROP TABLE IF EXISTS `users`;").unwrap();
        let orders = migration.content.find("DROP TABLE IF EXISTS `orders`;").unwrap();
        assert!(users < orders);
        assert!(!migration.content.contains("phinxlog"));
        assert_eq!(schema.requested, vec!["users", "orders"]);

        let included: Vec<&str> = migration.included().map(|t| t.name.as_str()).collect();
        let skipped: Vec<&str> = migration.skipped().map(|t| t.name.as_str()).collect();
        assert_eq!(included, vec!["users", "orders"]);
        assert_eq!(skipped, vec!["phinxlog"]);
    }

    #[tokio::test]
    async fn test_skip_list_applies_at_any_position() {
        let settings = GeneratorSettings {
            skip_tables: BTreeSet::from(["first".to_string(), "last".to_string()]),
            ..Default::default()
        };
        let mut schema = FakeSchema::new(&["first", "middle", "last"]);
        let migration = execute(&mut schema, &settings).await.unwrap();
        assert!(!migration.content.contains("`first`"));
        assert!(!migration.content.contains("`last`"));
        assert!(migration.content.contains("DROP TABLE IF EXISTS `middle`;"));
    }

    #[tokio::test]
    async fn test_empty_schema_renders_wrapper_only() {
        let mut schema = FakeSchema::new(&[]);
        let migration = execute(&mut schema, &GeneratorSettings::default())
            .await
            .unwrap();
        assert_eq!(
            migration.content,
            template::render_migration("InitialMigration", "")
        );
        assert!(migration.tables.is_empty());
    }

    #[tokio::test]
    async fn test_custom_class_name() {
        let settings = GeneratorSettings {
            class_name: "Bootstrap".to_string(),
            ..Default::default()
        };
        let mut schema = FakeSchema::new(&["users"]);
        let migration = execute(&mut schema, &settings).await.unwrap();
        assert!(migration
            .content
            .contains("class Bootstrap extends AbstractMigration"));
        assert_eq!(migration.class_name, "Bootstrap");
    }

    #[tokio::test]
    async fn test_sort_tables() {
        let settings = GeneratorSettings {
            sort_tables: true,
            ..Default::default()
        };
        let mut schema = FakeSchema::new(&["zebra", "apple", "mango"]);
        let migration = execute(&mut schema, &settings).await.unwrap();
        let names: Vec<&str> = migration.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[tokio::test]
    async fn test_fk_checks_wrap_all_fragments() {
        let mut schema = FakeSchema::new(&["a", "b", "c"]);
        let migration = execute(&mut schema, &GeneratorSettings::default())
            .await
            .unwrap();
        let content = &migration.content;
        assert_eq!(content.matches(template::DISABLE_FK_CHECKS).count(), 1);
        assert_eq!(content.matches(template::ENABLE_FK_CHECKS).count(), 1);

        let disable = content.find(template::DISABLE_FK_CHECKS).unwrap();
        let enable = content.find(template::ENABLE_FK_CHECKS).unwrap();
        for table in ["a", "b", "c"] {
            let drop = content
                .find(&format!("DROP TABLE IF EXISTS `{}`;", table))
                .unwrap();
            let create = content.find(&format!("CREATE TABLE `{}`", table)).unwrap();
            assert!(disable < drop && drop < create && create < enable);
        }
    }

    #[tokio::test]
    async fn test_reader_failure_aborts() {
        let mut schema = FakeSchema::new(&["users", "broken", "orders"]);
        schema.fail_on = Some("broken".to_string());
        let result = execute(&mut schema, &GeneratorSettings::default()).await;
        assert!(matches!(
            result,
            Err(PhinxgenError::QueryError { code: Some(1146), .. })
        ));
        assert_eq!(schema.requested, vec!["users", "broken"]);
    }

    #[tokio::test]
    async fn test_ddl_line_counts() {
        let mut schema = FakeSchema::new(&["users", "phinxlog"]);
        let migration = execute(&mut schema, &GeneratorSettings::default())
            .await
            .unwrap();
        assert_eq!(migration.tables[0].ddl_lines, 3);
        assert_eq!(migration.tables[1].ddl_lines, 0);
    }

    #[tokio::test]
    async fn test_report_serializes_without_content() {
        let mut schema = FakeSchema::new(&["users", "phinxlog"]);
        let migration = execute(&mut schema, &GeneratorSettings::default())
            .await
            .unwrap();
        let json = serde_json::to_value(&migration).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["class_name"], "InitialMigration");
        assert_eq!(json["tables"][0]["name"], "users");
        assert_eq!(json["tables"][0]["status"], "Included");
        assert_eq!(json["tables"][1]["status"], "Skipped");
    }
}
