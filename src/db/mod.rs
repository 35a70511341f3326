//! Database module

pub mod queries;
pub mod repository;

#[cfg(test)]
pub mod memory;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};

/// How long opening a pool may wait for its first connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection URL for a `server` (`[user[:password]@]host[:port]`) and database name
pub fn connection_url(server: &str, database: &str) -> String {
    format!("postgres://{}/{}", server.trim(), database.trim())
}

/// Host part of a server string, without credentials
fn display_host(server: &str) -> &str {
    server.rsplit('@').next().unwrap_or(server)
}

/// Create a database connection pool.
///
/// A failed connection is logged and yields `None`; the caller decides
/// whether the run can continue without it.
pub async fn connect(server: &str, database: &str, max_connections: u32) -> Option<PgPool> {
    let result = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(&connection_url(server, database))
        .await;

    match result {
        Ok(pool) => {
            info!("Connected to {}/{}", display_host(server), database);
            Some(pool)
        }
        Err(e) => {
            error!(
                "An exception occurred while connecting to {}/{}: {}",
                display_host(server),
                database,
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_url_includes_server_and_database() {
        assert_eq!(
            connection_url("etl:pw@db.local:5432", "staging"),
            "postgres://etl:pw@db.local:5432/staging"
        );
        assert_eq!(connection_url(" db.local ", "edw"), "postgres://db.local/edw");
    }

    #[test]
    fn display_host_strips_credentials() {
        assert_eq!(display_host("etl:pw@db.local:5432"), "db.local:5432");
        assert_eq!(display_host("db.local"), "db.local");
    }

    #[tokio::test]
    async fn connect_returns_none_when_server_is_unreachable() {
        assert!(connect("127.0.0.1:1", "x", 1).await.is_none());
    }
}
