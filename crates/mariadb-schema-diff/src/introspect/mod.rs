//! Live-schema introspection over a MariaDB/MySQL connection.
//!
//! The introspector enumerates every object kind with `SHOW`-class queries
//! and captures each object's `CREATE ...` text into the [`Snapshot`] as it
//! goes. The DDL is fetched *and stored* here, never re-fetched later: the
//! rollback planner needs the definitions of objects the forward plan drops,
//! and after execution those objects no longer exist.
//!
//! Uses SQLx for connection pooling and async query execution, the same way
//! as the rest of the stack.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use sqlx::Row;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::core::identifier::{quote, quote_str};
use crate::core::object::{ObjectKind, ObjectRecord, Snapshot};
use crate::error::{DiffError, Result};
use crate::parse::strip_preamble;

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fan-out for per-object DDL fetches over one pool. Completion order is
/// irrelevant: the snapshot re-sorts every kind's records by name.
const DDL_FETCH_CONCURRENCY: usize = 6;

/// Captures one schema's objects and their DDL.
pub struct Introspector {
    pool: MySqlPool,
    schema: String,
}

impl Introspector {
    /// Connect to the database and probe the connection.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.schema)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(DDL_FETCH_CONCURRENCY as u32 + 1)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| {
                DiffError::connection(
                    e,
                    format!(
                        "creating pool for {}:{}/{}",
                        config.host, config.port, config.schema
                    ),
                )
            })?;

        // Test connection
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                DiffError::connection(
                    e,
                    format!(
                        "testing connection to {}:{}/{}",
                        config.host, config.port, config.schema
                    ),
                )
            })?;

        info!(
            "Connected to {}:{}/{}",
            config.host, config.port, config.schema
        );

        Ok(Self {
            pool,
            schema: config.schema.clone(),
        })
    }

    /// Schema this introspector is bound to.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Capture a full snapshot of the schema.
    ///
    /// Enumeration errors are fatal. Per-object DDL errors are tolerated:
    /// the record is kept with an empty `ddl` and downstream stages skip it
    /// with a warning.
    pub async fn snapshot(&self, cancel: &CancellationToken) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new(&self.schema);

        for kind in ObjectKind::ALL {
            if cancel.is_cancelled() {
                return Err(DiffError::Cancelled);
            }

            let names = self.enumerate(kind).await?;
            debug!(schema = %self.schema, kind = %kind, count = names.len(), "enumerated objects");

            let records: Vec<ObjectRecord> =
                stream::iter(names.into_iter().map(|name| self.fetch_record(kind, name)))
                    .buffered(DDL_FETCH_CONCURRENCY)
                    .collect()
                    .await;

            snapshot.set_records(kind, records);
        }

        info!(
            schema = %self.schema,
            objects = snapshot.object_count(),
            "captured schema snapshot"
        );
        Ok(snapshot)
    }

    /// Enumerate the names of all objects of one kind, sorted by the server.
    async fn enumerate(&self, kind: ObjectKind) -> Result<Vec<String>> {
        let query = enumeration_query(kind, &self.schema);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DiffError::enumeration(kind.label(), &self.schema, e))?;

        let column = name_column(kind);
        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row
                .try_get(column)
                .map_err(|e| DiffError::enumeration(kind.label(), &self.schema, e))?;
            names.push(name);
        }
        Ok(names)
    }

    /// Fetch the `CREATE ...` text for one object. Failures (typically missing
    /// privileges) produce a record with empty DDL rather than aborting the
    /// snapshot.
    async fn fetch_record(&self, kind: ObjectKind, name: String) -> ObjectRecord {
        let query = format!("SHOW CREATE {} {}", kind.keyword(), quote(&name));
        let ddl = match sqlx::query(&query).fetch_one(&self.pool).await {
            Ok(row) => match row.try_get::<Option<String>, _>(kind.show_create_column()) {
                Ok(Some(ddl)) => strip_preamble(&ddl).to_string(),
                Ok(None) => {
                    warn!(kind = %kind, name = %name, "server returned NULL DDL (missing privileges?)");
                    String::new()
                }
                Err(e) => {
                    warn!(kind = %kind, name = %name, error = %e, "could not read DDL column");
                    String::new()
                }
            },
            Err(e) => {
                warn!(kind = %kind, name = %name, error = %e, "DDL extraction failed");
                String::new()
            }
        };
        ObjectRecord { name, ddl }
    }

    /// Close the connection pool. The pipeline releases each connection
    /// before diffing begins.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Enumeration query for one object kind. `SHOW` commands cannot always be
/// prepared with bind parameters, so the schema is inlined as an escaped
/// literal.
fn enumeration_query(kind: ObjectKind, schema: &str) -> String {
    match kind {
        ObjectKind::Table => "SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'".to_string(),
        ObjectKind::View => "SHOW FULL TABLES WHERE Table_type = 'VIEW'".to_string(),
        ObjectKind::Sequence => "SHOW FULL TABLES WHERE Table_type = 'SEQUENCE'".to_string(),
        ObjectKind::Procedure => {
            format!("SHOW PROCEDURE STATUS WHERE Db = {}", quote_str(schema))
        }
        ObjectKind::Function => {
            format!("SHOW FUNCTION STATUS WHERE Db = {}", quote_str(schema))
        }
        ObjectKind::Trigger => "SHOW TRIGGERS".to_string(),
        ObjectKind::Event => format!("SHOW EVENTS WHERE Db = {}", quote_str(schema)),
    }
}

/// Zero-based column holding the object name in the enumeration result.
/// Routine and event status rows lead with the `Db` column.
fn name_column(kind: ObjectKind) -> usize {
    match kind {
        ObjectKind::Procedure | ObjectKind::Function | ObjectKind::Event => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_queries() {
        assert_eq!(
            enumeration_query(ObjectKind::Table, "shop"),
            "SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'"
        );
        assert_eq!(
            enumeration_query(ObjectKind::Procedure, "shop"),
            "SHOW PROCEDURE STATUS WHERE Db = 'shop'"
        );
        assert_eq!(
            enumeration_query(ObjectKind::Event, "o'brien"),
            "SHOW EVENTS WHERE Db = 'o''brien'"
        );
        assert_eq!(enumeration_query(ObjectKind::Trigger, "shop"), "SHOW TRIGGERS");
    }

    #[test]
    fn test_name_columns() {
        assert_eq!(name_column(ObjectKind::Table), 0);
        assert_eq!(name_column(ObjectKind::Trigger), 0);
        assert_eq!(name_column(ObjectKind::Procedure), 1);
        assert_eq!(name_column(ObjectKind::Function), 1);
        assert_eq!(name_column(ObjectKind::Event), 1);
    }
}
