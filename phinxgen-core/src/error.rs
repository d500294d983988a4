//! Error types for phinxgen operations.

use thiserror::Error;

/// Extract the native code and message from a MySQL driver error.
///
/// Server-side failures carry a numeric code that the plain `Display` output
/// buries; everything else falls back to walking the source chain.
pub fn format_mysql_error(e: &mysql_async::Error) -> (Option<u16>, String) {
    if let mysql_async::Error::Server(server_err) = e {
        return (Some(server_err.code), server_err.message.clone());
    }
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        msg.push_str(&format!(": {}", s));
        source = s.source();
    }
    (None, msg)
}

/// Render an optional native error code for display.
fn display_code(code: &Option<u16>) -> String {
    match code {
        Some(c) => format!(" [{}]", c),
        None => String::new(),
    }
}

/// All error types that phinxgen operations can produce.
#[derive(Error, Debug)]
pub enum PhinxgenError {
    /// Invalid configuration (TOML parse errors, bad class name, bad date format, etc.).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// One or more required options were not supplied.
    #[error("Missing required option(s): {missing}")]
    UsageError { missing: String },

    /// The database could not be reached or refused the credentials.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A specific statement failed after the connection was established.
    #[error("Query failed{} for `{query}`: {message}", display_code(.code))]
    QueryError {
        query: String,
        code: Option<u16>,
        message: String,
    },

    /// The generated migration could not be written.
    #[error("Failed to write {path}: {source}")]
    OutputError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other filesystem I/O failure (reading the config file, etc.).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PhinxgenError {
    /// Wrap a driver error raised while running `query`.
    pub fn query(query: &str, e: &mysql_async::Error) -> Self {
        let (code, message) = format_mysql_error(e);
        PhinxgenError::QueryError {
            query: query.to_string(),
            code,
            message,
        }
    }

    /// Wrap a driver error raised while connecting.
    pub fn connection(e: &mysql_async::Error) -> Self {
        match format_mysql_error(e) {
            (Some(code), message) => {
                PhinxgenError::ConnectionError(format!("[{}] {}", code, message))
            }
            (None, message) => PhinxgenError::ConnectionError(message),
        }
    }
}

/// Convenience type alias for `Result<T, PhinxgenError>`.
pub type Result<T> = std::result::Result<T, PhinxgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display_with_code() {
        let err = PhinxgenError::QueryError {
            query: "SHOW CREATE TABLE `users`".to_string(),
            code: Some(1146),
            message: "Table 'app.users' doesn't exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Query failed [1146] for `SHOW CREATE TABLE `users``: Table 'app.users' doesn't exist"
        );
    }

    #[test]
    fn test_query_error_display_without_code() {
        let err = PhinxgenError::QueryError {
            query: "SHOW FULL TABLES".to_string(),
            code: None,
            message: "no result row".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Query failed for `SHOW FULL TABLES`: no result row"
        );
    }

    #[test]
    fn test_server_error_code_is_extracted() {
        let e = mysql_async::Error::Server(mysql_async::ServerError {
            code: 1045,
            message: "Access denied for user 'app'@'localhost'".to_string(),
            state: "28000".to_string(),
        });
        let (code, message) = format_mysql_error(&e);
        assert_eq!(code, Some(1045));
        assert!(message.starts_with("Access denied"));

        let conn_err = PhinxgenError::connection(&e);
        assert!(conn_err.to_string().contains("[1045]"));
    }

    #[test]
    fn test_output_error_names_path() {
        let err = PhinxgenError::OutputError {
            path: "./20240101000000_initial_migration.php".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err
            .to_string()
            .starts_with("Failed to write ./20240101000000_initial_migration.php"));
    }
}
