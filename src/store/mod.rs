//! Knowledge store access
//!
//! This module owns the single database connection used by one invocation and
//! provides:
//! - The document catalog (ordered ids from the full-document table)
//! - Atomic execution of cascade plans
//! - Row counts for the status view
//! - Schema bootstrap for empty stores

mod cascade;
mod schema;
#[cfg(test)]
pub(crate) mod testing;

pub use cascade::*;
pub use schema::*;

use crate::config::{CatalogConfig, Config};
use crate::error::{Error, Result};
use crate::plan::{CascadePlan, Dialect, DocumentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the selection workflow needs from a store
#[async_trait]
pub trait DocumentStore: Send {
    /// Document ids in ascending order
    async fn list_document_ids(&mut self) -> Result<Vec<DocumentId>>;

    /// Run every step of `plan` in one transaction
    async fn execute(&mut self, plan: &CascadePlan) -> std::result::Result<CascadeReport, DeletionError>;
}

pub(crate) enum Backend {
    Postgres(PgConnection),
    Sqlite(SqliteConnection),
}

impl Backend {
    fn dialect(&self) -> Dialect {
        match self {
            Backend::Postgres(_) => Dialect::Postgres,
            Backend::Sqlite(_) => Dialect::Sqlite,
        }
    }
}

/// Row count of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    /// `None` when the table could not be read
    pub rows: Option<i64>,
}

/// Exclusively owned store connection
pub struct Store {
    backend: Option<Backend>,
    dialect: Dialect,
    catalog: CatalogConfig,
    timeout: Duration,
}

impl Store {
    /// Connect using the database section of the config.
    ///
    /// A `sqlite:` URL opens an existing SQLite file; anything else connects to
    /// PostgreSQL, from `database.url` if set or the individual `PG*` fields.
    pub async fn connect(config: &Config) -> Result<Self> {
        let db = &config.database;

        let backend = match db.url.as_deref() {
            Some(url) if url.starts_with("sqlite:") => {
                debug!("Connecting to SQLite database at {}", url);
                let options = SqliteConnectOptions::from_str(url)?;
                Backend::Sqlite(open_sqlite(options).await?)
            }
            Some(url) => {
                debug!("Connecting to PostgreSQL with configured URL");
                let options = PgConnectOptions::from_str(url)?;
                Backend::Postgres(PgConnection::connect_with(&options).await?)
            }
            None => {
                debug!(
                    host = %db.host,
                    port = db.port,
                    user = %db.user,
                    database = %db.name,
                    "Connecting to PostgreSQL"
                );
                let mut options = PgConnectOptions::new()
                    .host(&db.host)
                    .port(db.port)
                    .username(&db.user)
                    .database(&db.name);
                if let Some(password) = &db.password {
                    options = options.password(password);
                }
                Backend::Postgres(PgConnection::connect_with(&options).await?)
            }
        };

        info!(dialect = %backend.dialect(), "Connected to knowledge store");
        Ok(Self::from_backend(backend, config))
    }

    /// Open (creating if needed) a SQLite store file
    pub async fn open_sqlite(path: &Path, config: &Config) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Opening SQLite store at {:?}", path);
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let conn = open_sqlite(options).await?;
        Ok(Self::from_backend(Backend::Sqlite(conn), config))
    }

    fn from_backend(backend: Backend, config: &Config) -> Self {
        Self {
            dialect: backend.dialect(),
            backend: Some(backend),
            catalog: config.catalog.clone(),
            timeout: config.cascade.timeout(),
        }
    }

    /// Override the cascade deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn backend_mut(&mut self) -> Result<&mut Backend> {
        self.backend
            .as_mut()
            .ok_or_else(|| Error::Other("store connection is closed".to_string()))
    }

    /// Drop the connection without committing anything still open
    pub(crate) fn abandon(&mut self) {
        if self.backend.take().is_some() {
            warn!("Abandoned store connection; any open transaction is rolled back by the server");
        }
    }

    /// Create the default LightRAG tables if they do not exist
    pub async fn init_schema(&mut self) -> Result<()> {
        info!("Initializing knowledge store schema");
        match self.backend_mut()? {
            Backend::Postgres(conn) => {
                sqlx::raw_sql(POSTGRES_SCHEMA_SQL).execute(&mut *conn).await?;
            }
            Backend::Sqlite(conn) => {
                sqlx::raw_sql(SQLITE_SCHEMA_SQL).execute(&mut *conn).await?;
            }
        }
        Ok(())
    }

    /// List document ids from the catalog table, ascending
    pub async fn list_document_ids(&mut self) -> Result<Vec<DocumentId>> {
        let id = self.dialect.quote_ident(&self.catalog.id_column);
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            id,
            self.dialect.quote_ident(&self.catalog.table),
            id
        );

        let ids: Vec<String> = match self.backend_mut()? {
            Backend::Postgres(conn) => sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?,
            Backend::Sqlite(conn) => sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?,
        };

        debug!(count = ids.len(), "Listed document ids");
        Ok(ids.into_iter().map(DocumentId::from).collect())
    }

    /// Count rows in each table; unreadable tables report `None`
    pub async fn row_counts(&mut self, tables: &[String]) -> Result<Vec<TableCount>> {
        let mut counts = Vec::with_capacity(tables.len());

        for table in tables {
            let sql = format!("SELECT COUNT(*) FROM {}", self.dialect.quote_ident(table));
            let result: std::result::Result<i64, sqlx::Error> = match self.backend_mut()? {
                Backend::Postgres(conn) => sqlx::query_scalar(&sql).fetch_one(&mut *conn).await,
                Backend::Sqlite(conn) => sqlx::query_scalar(&sql).fetch_one(&mut *conn).await,
            };

            let rows = match result {
                Ok(n) => Some(n),
                Err(e) => {
                    debug!(table = %table, "Could not count rows: {}", e);
                    None
                }
            };
            counts.push(TableCount {
                table: table.clone(),
                rows,
            });
        }

        Ok(counts)
    }

    /// Close the connection whatever `result` holds, then hand `result` back.
    ///
    /// A close failure is only reported when `result` itself succeeded.
    pub async fn close_after<T>(self, result: Result<T>) -> Result<T> {
        let closed = self.close().await;
        match result {
            Ok(value) => closed.map(|_| value),
            Err(e) => {
                if let Err(close_err) = closed {
                    warn!("Could not close store connection: {}", close_err);
                }
                Err(e)
            }
        }
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        match self.backend.take() {
            Some(Backend::Postgres(conn)) => conn.close().await?,
            Some(Backend::Sqlite(conn)) => conn.close().await?,
            None => {}
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for Store {
    async fn list_document_ids(&mut self) -> Result<Vec<DocumentId>> {
        Store::list_document_ids(self).await
    }

    async fn execute(&mut self, plan: &CascadePlan) -> std::result::Result<CascadeReport, DeletionError> {
        Store::execute(self, plan).await
    }
}

/// SQLite connections match `LIKE` case-sensitively, as PostgreSQL does
async fn open_sqlite(options: SqliteConnectOptions) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::connect_with(&options).await?;
    sqlx::query("PRAGMA case_sensitive_like = ON")
        .execute(&mut conn)
        .await?;
    Ok(conn)
}
