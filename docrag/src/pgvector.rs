//! pgvector (PostgreSQL) vector store backend.
//!
//! Provides [`PgVectorStore`] which implements [`VectorStore`] using
//! [sqlx](https://docs.rs/sqlx) with the
//! [pgvector](https://github.com/pgvector/pgvector) PostgreSQL extension.
//!
//! # Prerequisites
//!
//! - PostgreSQL with the `pgvector` extension installed
//! - A role allowed to run `CREATE EXTENSION IF NOT EXISTS vector`, or a
//!   database where the extension and table already exist
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::pgvector::{PgVectorConfig, PgVectorStore};
//!
//! let config = PgVectorConfig::new("localhost", "vectordb", 1536).with_port(5433);
//! let store = PgVectorStore::connect(&config).await?;
//! store.ensure_schema().await?;
//! store.bulk_insert("manual.txt", &chunks).await?;
//! let results = store.search(&query_embedding, DistanceMetric::Cosine, 5, 0.5).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use tracing::{debug, error};

use crate::document::{EmbeddedChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::metric::DistanceMetric;
use crate::vectorstore::{VectorStore, validate_chunks, validate_search};

const BACKEND: &str = "pgvector";

/// Connection and table settings for [`PgVectorStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgVectorConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Role to connect as.
    #[serde(default = "default_user")]
    pub user: String,
    /// Password for `user`.
    #[serde(default)]
    pub password: Option<String>,
    /// Table holding the records.
    #[serde(default = "default_table")]
    pub table: String,
    /// Embedding dimensionality of the `embedding` column.
    pub dimensions: usize,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long to wait for a pooled connection, in seconds.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl PgVectorConfig {
    /// Creates a configuration with default port, user, table and pool size.
    pub fn new(host: impl Into<String>, database: impl Into<String>, dimensions: usize) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            database: database.into(),
            user: default_user(),
            password: None,
            table: default_table(),
            dimensions,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the user and password.
    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = Some(password.into());
        self
    }

    /// Sets the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the maximum number of pooled connections.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_table() -> String {
    "vectors".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

/// A [`VectorStore`] backed by PostgreSQL with the pgvector extension.
///
/// The table has columns `id` (insertion order), `document_name`, `text`
/// and `embedding vector(dimensions)`. Each bulk insert runs in a single
/// transaction, so a failed batch leaves no rows behind.
pub struct PgVectorStore {
    pool: PgPool,
    table: String,
    dimensions: usize,
}

impl PgVectorStore {
    /// Connect a pool using the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] for an unusable table name
    /// or zero dimensions, and [`RagError::StoreConnection`] if the database
    /// cannot be reached.
    pub async fn connect(config: &PgVectorConfig) -> Result<Self> {
        let table = sanitize_table_name(&config.table)?;
        if config.dimensions == 0 {
            return Err(RagError::invalid("dimensions must be greater than zero"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(config.connect_options())
            .await
            .map_err(|e| {
                error!(
                    host = %config.host,
                    port = config.port,
                    error = %e,
                    "failed to connect to postgres"
                );
                map_err(e)
            })?;

        debug!(
            host = %config.host,
            database = %config.database,
            %table,
            "connected pgvector store"
        );
        Ok(Self { pool, table, dimensions: config.dimensions })
    }

    /// Create a store from an existing connection pool.
    pub fn from_pool(pool: PgPool, table: &str, dimensions: usize) -> Result<Self> {
        Ok(Self { pool, table: sanitize_table_name(table)?, dimensions })
    }

    /// Create the pgvector extension and the records table if they are missing.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the table already exists with
    /// an `embedding` column of a different width.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        sqlx::query(&create_table_sql(&self.table, self.dimensions))
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        let declared: Option<i32> = sqlx::query_scalar(COLUMN_WIDTH_SQL)
            .bind(&self.table)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        if let Some(declared) = declared {
            check_column_width(declared, self.dimensions).inspect_err(|e| {
                error!(table = %self.table, error = %e, "existing table has a different width");
            })?;
        }

        debug!(table = %self.table, dimensions = self.dimensions, "ensured pgvector schema");
        Ok(())
    }
}

/// Sanitize a table name. Only allows alphanumeric characters and underscores.
fn sanitize_table_name(name: &str) -> Result<String> {
    let sanitized: String =
        name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect();
    if sanitized.is_empty() || sanitized.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(RagError::invalid(format!("'{name}' is not a usable table name")));
    }
    Ok(sanitized)
}

/// Classify sqlx errors into connection and query failures.
fn map_err(e: sqlx::Error) -> RagError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            RagError::StoreConnection { backend: BACKEND.to_string(), message: e.to_string() }
        }
        other => RagError::StoreQuery { backend: BACKEND.to_string(), message: other.to_string() },
    }
}

/// pgvector expects the vector as a string like `[1,2,3]`.
fn vector_literal(embedding: &[f32]) -> String {
    format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
}

fn create_table_sql(table: &str, dimensions: usize) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
            id BIGSERIAL PRIMARY KEY, \
            document_name TEXT NOT NULL, \
            text TEXT NOT NULL, \
            embedding vector({dimensions}) NOT NULL\
        )"
    )
}

/// Declared width of the `embedding` column. pgvector stores it as the typmod.
const COLUMN_WIDTH_SQL: &str = "SELECT atttypmod FROM pg_attribute \
     WHERE attrelid = to_regclass($1) AND attname = 'embedding' AND NOT attisdropped";

/// A negative typmod means the column was declared without a width.
fn check_column_width(declared: i32, dimensions: usize) -> Result<()> {
    match usize::try_from(declared) {
        Ok(width) if width != dimensions => {
            Err(RagError::DimensionMismatch { expected: dimensions, actual: width })
        }
        _ => Ok(()),
    }
}

fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (document_name, text, embedding) VALUES ($1, $2, $3::vector)")
}

fn search_sql(table: &str, metric: DistanceMetric) -> String {
    let op = metric.operator();
    format!(
        "SELECT text, (embedding {op} $1::vector)::float8 AS distance \
         FROM {table} \
         WHERE embedding {op} $1::vector < $2 \
         ORDER BY distance, id \
         LIMIT $3"
    )
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn reset_collection(&self) -> Result<()> {
        let sql = format!("TRUNCATE TABLE {}", self.table);
        sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
            error!(table = %self.table, error = %e, "truncate failed");
            map_err(e)
        })?;

        debug!(table = %self.table, "truncated pgvector table");
        Ok(())
    }

    async fn bulk_insert(&self, document_name: &str, chunks: &[EmbeddedChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        validate_chunks(chunks, self.dimensions)?;

        let sql = insert_sql(&self.table);
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        for chunk in chunks {
            sqlx::query(&sql)
                .bind(document_name)
                .bind(&chunk.text)
                .bind(vector_literal(&chunk.embedding))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!(table = %self.table, document_name, error = %e, "insert failed");
                    map_err(e)
                })?;
        }

        tx.commit().await.map_err(map_err)?;

        debug!(
            table = %self.table,
            document_name,
            count = chunks.len(),
            "inserted chunks into pgvector"
        );
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        metric: DistanceMetric,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        validate_search(embedding, self.dimensions, top_k, min_score)?;

        let rows = sqlx::query(&search_sql(&self.table, metric))
            .bind(vector_literal(embedding))
            .bind(f64::from(min_score))
            .bind(i64::try_from(top_k).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(table = %self.table, %metric, error = %e, "search failed");
                map_err(e)
            })?;

        let results = rows
            .iter()
            .map(|row| -> std::result::Result<SearchResult, sqlx::Error> {
                let text: String = row.try_get("text")?;
                let distance: f64 = row.try_get("distance")?;
                Ok(SearchResult { text, distance: distance as f32 })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_err)?;

        debug!(
            table = %self.table,
            %metric,
            top_k,
            min_score,
            result_count = results.len(),
            "searched pgvector"
        );
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await.map_err(map_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
