#![forbid(unsafe_code)]

mod cli;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docrag::openai::OpenAIEmbeddingProvider;
use docrag::pgvector::PgVectorStore;
use docrag::{RagConfig, RagPipeline, SearchResult, prompt};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, EmbeddingArgs};

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(error = %format!("{error:#}"), "docrag failed");
    } else {
        eprintln!("Error: {error:#}");
    }
    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let pipeline = build_pipeline(&cli).await?;

    match &cli.command {
        Command::Ingest(args) => {
            let report = pipeline
                .ingest_with(&args.file, &args.options(cli.dimensions))
                .await
                .with_context(|| format!("failed to ingest {}", args.file.display()))?;
            let stored =
                pipeline.vector_store().count().await.context("failed to count records")?;
            println!(
                "ingested {} chunks from {} ({stored} records stored)",
                report.chunk_count, report.document_name
            );
        }
        Command::Query(args) if args.scores => {
            let results = pipeline
                .search(&args.question, &args.options())
                .await
                .context("retrieval failed")?;
            print!("{}", render_scores(&results));
        }
        Command::Query(args) => {
            let snippets = pipeline
                .retrieve_with(&args.question, &args.options())
                .await
                .context("retrieval failed")?;
            if args.prompt {
                println!("{}", render_prompt(&args.question, &snippets));
            } else if snippets.is_empty() {
                println!("{}", prompt::NO_CONTEXT);
            } else {
                for snippet in &snippets {
                    println!("{snippet}\n");
                }
            }
        }
    }

    Ok(())
}

async fn build_pipeline(cli: &Cli) -> anyhow::Result<RagPipeline> {
    let store_config = cli.database.store_config(cli.dimensions);
    let store = PgVectorStore::connect(&store_config)
        .await
        .with_context(|| {
            format!("failed to connect to {}:{}", store_config.host, store_config.port)
        })?;
    store.ensure_schema().await.context("failed to prepare the vector table")?;

    let provider = embedding_provider(&cli.embeddings)?;
    tracing::info!(endpoint = provider.endpoint(), table = %store_config.table, "pipeline ready");

    let config = RagConfig::builder().dimensions(cli.dimensions).build()?;
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(provider))
        .vector_store(Arc::new(store))
        .build()?;
    Ok(pipeline)
}

fn embedding_provider(args: &EmbeddingArgs) -> anyhow::Result<OpenAIEmbeddingProvider> {
    let provider = match &args.embeddings_url {
        Some(url) => OpenAIEmbeddingProvider::deployment(url, &args.deployment, &args.api_key)?,
        None => {
            let provider = OpenAIEmbeddingProvider::new(&args.api_key)?;
            match &args.model {
                Some(model) => provider.with_model(model),
                None => provider,
            }
        }
    };
    Ok(provider)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// One `distance<TAB>text` line per result, closest first.
fn render_scores(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("{}\n", prompt::NO_CONTEXT);
    }
    results.iter().map(|r| format!("{:.4}\t{}\n", r.distance, r.text)).collect()
}

/// The system prompt followed by the user turn carrying the snippets.
fn render_prompt(question: &str, snippets: &[String]) -> String {
    format!("{}\n\n{}", prompt::SYSTEM_PROMPT, prompt::augment(question, snippets))
}
