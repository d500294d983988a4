//! MySQL connection setup and identifier quoting.

use std::time::Duration;

use mysql_async::{Conn, Opts, OptsBuilder};

use crate::config::DatabaseConfig;
use crate::error::{PhinxgenError, Result};

/// Quote a MySQL identifier with backticks.
///
/// Doubles any embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Build driver options from the resolved database settings.
///
/// Fails with a `ConfigError` when the database name or user is missing.
pub fn connection_opts(config: &DatabaseConfig) -> Result<Opts> {
    let name = config
        .name
        .as_deref()
        .ok_or_else(|| PhinxgenError::ConfigError("Database name is required".to_string()))?;
    let user = config
        .user
        .as_deref()
        .ok_or_else(|| PhinxgenError::ConfigError("Database user is required".to_string()))?;

    let builder = OptsBuilder::default()
        .ip_or_hostname(config.host.as_str())
        .tcp_port(config.port)
        .user(Some(user))
        .pass(config.password.as_deref())
        .db_name(Some(name));

    Ok(Opts::from(builder))
}

/// Open a single connection, giving up after `connect_timeout_secs` (0 = wait forever).
///
/// There is no retry: any failure here is reported as a `ConnectionError`.
pub async fn connect(opts: Opts, connect_timeout_secs: u32) -> Result<Conn> {
    let host = opts.ip_or_hostname().to_string();
    let port = opts.tcp_port();
    log::debug!("Connecting to MySQL; host={}, port={}", host, port);

    let conn = if connect_timeout_secs > 0 {
        match tokio::time::timeout(
            Duration::from_secs(connect_timeout_secs as u64),
            Conn::new(opts),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                return Err(PhinxgenError::ConnectionError(format!(
                    "Timed out after {}s connecting to {}:{}",
                    connect_timeout_secs, host, port
                )));
            }
        }
    } else {
        Conn::new(opts).await
    };

    conn.map_err(|e| {
        log::debug!("Connection failed; host={}, port={}, error={}", host, port, e);
        PhinxgenError::connection(&e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> DatabaseConfig {
        DatabaseConfig {
            name: Some("app".to_string()),
            user: Some("root".to_string()),
            password: Some("secret".to_string()),
            host: "db.internal".to_string(),
            port: 3307,
            ..Default::default()
        }
    }

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("users"), "`users`");
    }

    #[test]
    fn test_quote_ident_embedded_backtick() {
        assert_eq!(quote_ident("my`table"), "`my``table`");
    }

    #[test]
    fn test_quote_ident_empty() {
        assert_eq!(quote_ident(""), "``");
    }

    #[test]
    fn test_connection_opts_from_fields() {
        let opts = connection_opts(&complete_config()).unwrap();
        assert_eq!(opts.ip_or_hostname(), "db.internal");
        assert_eq!(opts.tcp_port(), 3307);
        assert_eq!(opts.user(), Some("root"));
        assert_eq!(opts.pass(), Some("secret"));
        assert_eq!(opts.db_name(), Some("app"));
    }

    #[test]
    fn test_connection_opts_missing_user() {
        let config = DatabaseConfig {
            user: None,
            ..complete_config()
        };
        assert!(matches!(
            connection_opts(&config),
            Err(PhinxgenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_connection_opts_missing_name() {
        let config = DatabaseConfig {
            name: None,
            ..complete_config()
        };
        assert!(connection_opts(&config).is_err());
    }
}
