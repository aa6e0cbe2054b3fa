//! End-to-end ingest and retrieve tests with a scripted embedding provider.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docrag::{
    DistanceMetric, Document, EmbeddingProvider, IndexedEmbeddings, IngestOptions,
    InMemoryVectorStore, RagConfig, RagError, RagPipeline, Result, RetrievalOptions, VectorStore,
};

/// Returns a fixed vector per known text and counts calls.
struct ScriptedProvider {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(pairs: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: pairs.iter().map(|(t, v)| (t.to_string(), v.clone())).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed_batch(&self, texts: &[&str], _dimensions: usize) -> Result<IndexedEmbeddings> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Answer back to front; callers must realign by index.
        texts
            .iter()
            .enumerate()
            .rev()
            .map(|(i, text)| -> Result<(usize, Vec<f32>)> {
                let vector = self.vectors.get(*text).cloned().ok_or_else(|| {
                    RagError::embedding("scripted", Some(400), format!("unknown text '{text}'"))
                })?;
                Ok((i, vector))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Always fails like an unavailable upstream.
struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed_batch(&self, _texts: &[&str], _dimensions: usize) -> Result<IndexedEmbeddings> {
        Err(RagError::embedding("failing", Some(503), "service unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Drops the last embedding of every batch.
struct ShortProvider;

#[async_trait]
impl EmbeddingProvider for ShortProvider {
    async fn embed_batch(&self, texts: &[&str], dimensions: usize) -> Result<IndexedEmbeddings> {
        Ok((0..texts.len().saturating_sub(1)).map(|i| (i, vec![1.0; dimensions])).collect())
    }

    fn name(&self) -> &str {
        "short"
    }
}

fn axes_provider() -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(&[
        ("AAAAA", vec![1.0, 0.0]),
        ("BBBBB", vec![0.0, 1.0]),
        ("CCCCC", vec![1.0, 1.0]),
        ("tell me about A", vec![1.0, 0.0]),
        ("tell me about B", vec![0.0, 1.0]),
    ]))
}

fn pipeline(provider: Arc<dyn EmbeddingProvider>, store: Arc<InMemoryVectorStore>) -> RagPipeline {
    RagPipeline::builder()
        .config(RagConfig::builder().chunk_size(5).chunk_overlap(0).dimensions(2).build().unwrap())
        .embedding_provider(provider)
        .vector_store(store)
        .build()
        .unwrap()
}

fn abc_options() -> IngestOptions {
    IngestOptions { chunk_size: 5, chunk_overlap: 0, dimensions: 2, reset_first: true }
}

#[tokio::test]
async fn ingest_then_retrieve_ranks_by_cosine_distance() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store.clone());

    let report = pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &abc_options())
        .await
        .unwrap();
    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.document_name, "abc.txt");
    assert_eq!(store.count().await.unwrap(), 3);

    let snippets = pipeline
        .retriever()
        .retrieve("tell me about A", DistanceMetric::Cosine, 2, 0.5)
        .await
        .unwrap();
    // [1,0] at distance 0, [1,1] at ~0.29, [0,1] at 1.0 is excluded.
    assert_eq!(snippets, ["AAAAA", "CCCCC"]);
}

#[tokio::test]
async fn each_chunk_is_stored_with_its_own_embedding() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store.clone());
    pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &abc_options())
        .await
        .unwrap();

    let expectations =
        [(vec![1.0, 0.0], "AAAAA"), (vec![0.0, 1.0], "BBBBB"), (vec![1.0, 1.0], "CCCCC")];
    for (query, expected) in expectations {
        let results = store.search(&query, DistanceMetric::Cosine, 1, 0.1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, expected);
        assert!(results[0].distance.abs() < 1e-6);
    }
}

#[tokio::test]
async fn euclidean_threshold_uses_l2_distance() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store);
    pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &abc_options())
        .await
        .unwrap();

    let options = RetrievalOptions { metric: DistanceMetric::Euclidean, top_k: 5, min_score: 1.2 };
    let results = pipeline.search("tell me about B", &options).await.unwrap();
    let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["BBBBB", "CCCCC"]);
}

#[tokio::test]
async fn reset_first_replaces_previous_ingestion() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store.clone());
    let doc = Document::new("abc.txt", "AAAAABBBBBCCCCC");

    pipeline.ingest_document(&doc, &abc_options()).await.unwrap();
    pipeline.ingest_document(&doc, &abc_options()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 3);

    let append = IngestOptions { reset_first: false, ..abc_options() };
    pipeline.ingest_document(&doc, &append).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 6);
}

#[tokio::test]
async fn retrieve_after_reset_is_empty() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store);
    pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &abc_options())
        .await
        .unwrap();
    pipeline.reset_collection().await.unwrap();

    let snippets = pipeline.retrieve("tell me about A").await.unwrap();
    assert!(snippets.is_empty());
}

#[tokio::test]
async fn empty_document_skips_embedding() {
    let provider = axes_provider();
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(provider.clone(), store.clone());

    let report =
        pipeline.ingest_document(&Document::new("empty.txt", ""), &abc_options()).await.unwrap();
    assert_eq!(report.chunk_count, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn embedding_errors_propagate_unchanged() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(Arc::new(FailingProvider), store.clone());

    let err = pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &abc_options())
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::EmbeddingService { status: Some(503), .. }));
    assert_eq!(store.count().await.unwrap(), 0);

    let err = pipeline.retrieve("anything").await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingService { status: Some(503), .. }));
}

#[tokio::test]
async fn missing_embedding_index_fails_ingestion() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(Arc::new(ShortProvider), store.clone());

    let err = pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &abc_options())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RagError::EmbeddingService { ref message, .. } if message.contains("index 2")
    ));
    assert!(!err.is_transient());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn dimension_disagreement_with_store_is_rejected() {
    let provider = axes_provider();
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(provider.clone(), store);

    let options = IngestOptions { dimensions: 3, ..abc_options() };
    let err = pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_retrieval_options_fail_before_embedding() {
    let provider = axes_provider();
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(provider.clone(), store);

    let err = pipeline
        .retriever()
        .retrieve("tell me about A", DistanceMetric::Cosine, 0, 0.5)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_chunking_is_rejected() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store);

    let options = IngestOptions { chunk_size: 5, chunk_overlap: 5, ..abc_options() };
    let err = pipeline
        .ingest_document(&Document::new("abc.txt", "AAAAABBBBBCCCCC"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn ingest_names_document_after_file() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"AAAAABBBBBCCCCC").unwrap();
    let expected_name = file.path().file_name().unwrap().to_string_lossy().into_owned();

    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store);

    let report = pipeline.ingest_with(file.path(), &abc_options()).await.unwrap();
    assert_eq!(report.document_name, expected_name);
    assert_eq!(report.chunk_count, 3);
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let store = Arc::new(InMemoryVectorStore::new(2));
    let pipeline = pipeline(axes_provider(), store);

    let err = pipeline.ingest_with("/definitely/not/here.txt", &abc_options()).await.unwrap_err();
    assert!(matches!(err, RagError::Io { .. }));
}

#[test]
fn builder_requires_every_component() {
    let err = RagPipeline::builder().config(RagConfig::default()).build().err().unwrap();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}
