//! Command-line arguments.
//!
//! ```text
//! Cli
//! ├── database: DatabaseArgs    # pgvector connection and table
//! ├── embeddings: EmbeddingArgs # endpoint, deployment, key
//! └── command: Command          # ingest | query
//! ```
//!
//! Every connection setting can also be supplied through its environment
//! variable.

use clap::{Args, Parser, Subcommand};
use docrag::pgvector::PgVectorConfig;
use docrag::{DistanceMetric, IngestOptions, RetrievalOptions};

/// Ingest documents into pgvector and retrieve context for questions.
#[derive(Debug, Clone, Parser)]
#[command(name = "docrag")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub database: DatabaseArgs,

    #[clap(flatten)]
    pub embeddings: EmbeddingArgs,

    /// Embedding dimensionality shared by the provider and the table.
    #[arg(long, env = "DOCRAG_DIMENSIONS", default_value_t = 1536, global = true)]
    pub dimensions: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Chunk a text file, embed the chunks and store them.
    Ingest(IngestArgs),
    /// Retrieve the snippets closest to a question.
    Query(QueryArgs),
}

#[derive(Debug, Clone, Args)]
pub struct IngestArgs {
    /// Path of the UTF-8 text file to ingest.
    pub file: std::path::PathBuf,

    /// Characters per chunk.
    #[arg(long, default_value_t = 300)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, default_value_t = 40)]
    pub overlap: usize,

    /// Append to the collection instead of clearing it first.
    #[arg(long)]
    pub no_reset: bool,
}

impl IngestArgs {
    pub fn options(&self, dimensions: usize) -> IngestOptions {
        IngestOptions {
            chunk_size: self.chunk_size,
            chunk_overlap: self.overlap,
            dimensions,
            reset_first: !self.no_reset,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Question to retrieve context for.
    pub question: String,

    /// Distance metric: `cosine` or `euclidean`.
    #[arg(long, default_value = "cosine")]
    pub metric: DistanceMetric,

    /// Maximum number of snippets.
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    /// Exclusive upper bound on distance.
    #[arg(long, default_value_t = 0.5)]
    pub min_score: f32,

    /// Print the system prompt and the augmented user turn instead of the raw snippets.
    #[arg(long, conflicts_with = "scores")]
    pub prompt: bool,

    /// Print each snippet with its distance, tab separated.
    #[arg(long)]
    pub scores: bool,
}

impl QueryArgs {
    pub fn options(&self) -> RetrievalOptions {
        RetrievalOptions { metric: self.metric, top_k: self.top_k, min_score: self.min_score }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    #[arg(long = "db-host", env = "DOCRAG_DB_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(long = "db-port", env = "DOCRAG_DB_PORT", default_value_t = 5432)]
    pub port: u16,

    #[arg(long = "db-name", env = "DOCRAG_DB_NAME", default_value = "vectordb")]
    pub database: String,

    #[arg(long = "db-user", env = "DOCRAG_DB_USER", default_value = "postgres")]
    pub user: String,

    #[arg(long = "db-password", env = "DOCRAG_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long = "db-table", env = "DOCRAG_DB_TABLE", default_value = "vectors")]
    pub table: String,
}

impl DatabaseArgs {
    pub fn store_config(&self, dimensions: usize) -> PgVectorConfig {
        let mut config = PgVectorConfig::new(&self.host, &self.database, dimensions)
            .with_port(self.port)
            .with_table(&self.table);
        config.user = self.user.clone();
        config.password = self.password.clone();
        config
    }
}

#[derive(Debug, Clone, Args)]
pub struct EmbeddingArgs {
    /// Base URL of an Azure-style endpoint. The public OpenAI API is used when unset.
    #[arg(long, env = "DOCRAG_EMBEDDINGS_URL")]
    pub embeddings_url: Option<String>,

    /// Deployment name, used together with `--embeddings-url`.
    #[arg(long, env = "DOCRAG_EMBEDDINGS_DEPLOYMENT", default_value = "text-embedding-3-small-1")]
    pub deployment: String,

    /// Model name sent to the public OpenAI API.
    #[arg(long, env = "DOCRAG_EMBEDDINGS_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,
}
