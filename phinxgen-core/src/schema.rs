//! MySQL schema introspection: table listing and `SHOW CREATE TABLE`.
//!
//! [`SchemaSource`] is the seam the generator pulls from; [`SchemaReader`]
//! implements it over a single lazily-opened `mysql_async` connection.

use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts};

use crate::config::DatabaseConfig;
use crate::db::{self, quote_ident};
use crate::error::{PhinxgenError, Result};

/// Lists base tables, excluding views.
pub const LIST_TABLES_SQL: &str = "SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'";

/// Build the `SHOW CREATE TABLE` query for one table.
pub fn show_create_table_sql(table: &str) -> String {
    format!("SHOW CREATE TABLE {}", quote_ident(table))
}

/// Anything that can enumerate tables and hand back their DDL.
#[allow(async_fn_in_trait)]
pub trait SchemaSource {
    /// Base table names, in the order the source yields them.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// The full `CREATE TABLE` statement for `table`.
    async fn create_statement(&mut self, table: &str) -> Result<String>;
}

/// Reads schema information from a live MySQL database.
///
/// The connection is opened on the first query and reused afterwards.
pub struct SchemaReader {
    opts: Opts,
    connect_timeout_secs: u32,
    conn: Option<Conn>,
}

impl SchemaReader {
    /// Prepare a reader; no connection is made yet.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self {
            opts: db::connection_opts(config)?,
            connect_timeout_secs: config.connect_timeout_secs,
            conn: None,
        })
    }

    /// Whether a connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn conn(&mut self) -> Result<&mut Conn> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let conn = db::connect(self.opts.clone(), self.connect_timeout_secs).await?;
                log::debug!(
                    "Connected; host={}, database={}",
                    self.opts.ip_or_hostname(),
                    self.opts.db_name().unwrap_or_default()
                );
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Disconnect if a connection was opened.
    pub async fn close(mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect()
                .await
                .map_err(|e| PhinxgenError::connection(&e))?;
            log::debug!("Disconnected");
        }
        Ok(())
    }
}

impl SchemaSource for SchemaReader {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let conn = self.conn().await?;
        let rows: Vec<(String, String)> = conn
            .query(LIST_TABLES_SQL)
            .await
            .map_err(|e| PhinxgenError::query(LIST_TABLES_SQL, &e))?;
        Ok(rows.into_iter().map(|(name, _kind)| name).collect())
    }

    async fn create_statement(&mut self, table: &str) -> Result<String> {
        let sql = show_create_table_sql(table);
        let conn = self.conn().await?;
        let row: Option<(String, String)> = conn
            .query_first(sql.as_str())
            .await
            .map_err(|e| PhinxgenError::query(&sql, &e))?;

        match row {
            Some((_name, ddl)) => Ok(ddl),
            None => Err(PhinxgenError::QueryError {
                query: sql,
                code: None,
                message: format!("no CREATE TABLE row returned for '{}'", table),
            }),
        }
    }
}
