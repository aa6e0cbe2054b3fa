//! OpenAI-compatible embedding provider.
//!
//! This module is only available when the `openai` feature is enabled.
//! It speaks the OpenAI embeddings wire format against either the public
//! OpenAI endpoint or an Azure-style deployment endpoint
//! (`{base}/openai/deployments/{deployment}/embeddings` with an `api-key`
//! header).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{EmbeddingProvider, IndexedEmbeddings};
use crate::error::{RagError, Result};

/// The default OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The default model for OpenAI embeddings.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Request timeout applied unless overridden.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const PROVIDER: &str = "OpenAI";

/// How the API key is presented to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `api-key: <key>`
    ApiKeyHeader,
}

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::deployment(
///     "https://proxy.example.com",
///     "text-embedding-3-small-1",
///     api_key,
/// )?;
/// let embedding = provider.embed("hello world", 1536).await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    auth: Auth,
    /// Sent in the request body; deployment endpoints encode the model in the URL.
    model: Option<String>,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for the public OpenAI API with the given key.
    ///
    /// Uses the default model (`text-embedding-3-small`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::build(OPENAI_EMBEDDINGS_URL.to_string(), api_key.into(), Auth::Bearer)
            .map(|provider| provider.with_model(DEFAULT_MODEL))
    }

    /// Create a provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::embedding(PROVIDER, None, "OPENAI_API_KEY environment variable not set")
        })?;
        Self::new(api_key)
    }

    /// Create a provider for an Azure-style deployment endpoint.
    ///
    /// The request goes to `{base_url}/openai/deployments/{deployment}/embeddings`
    /// and the key is sent in an `api-key` header.
    pub fn deployment(
        base_url: &str,
        deployment: &str,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = format!(
            "{}/openai/deployments/{deployment}/embeddings",
            base_url.trim_end_matches('/')
        );
        Self::build(endpoint, api_key.into(), Auth::ApiKeyHeader)
    }

    fn build(endpoint: String, api_key: String, auth: Auth) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RagError::embedding(PROVIDER, None, "API key must not be empty"));
        }

        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build().map_err(|e| {
            RagError::embedding(PROVIDER, None, format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, endpoint, api_key, auth, model: None })
    }

    /// Set the model name sent in the request body (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replace the HTTP client, e.g. to change the request timeout.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a [&'a str],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn into_indexed(response: EmbeddingResponse) -> IndexedEmbeddings {
    response.data.into_iter().map(|d| (d.index, d.embedding)).collect()
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str], dimensions: usize) -> Result<IndexedEmbeddings> {
        if texts.is_empty() {
            return Ok(IndexedEmbeddings::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            dimensions,
            endpoint = %self.endpoint,
            "embedding batch"
        );

        let request_body =
            EmbeddingRequest { model: self.model.as_deref(), input: texts, dimensions };

        let request = self.client.post(&self.endpoint).json(&request_body);
        let request = match self.auth {
            Auth::Bearer => request.bearer_auth(&self.api_key),
            Auth::ApiKeyHeader => request.header("api-key", &self.api_key),
        };

        let response = request.send().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "request failed");
            let message = format!("request failed: {e}");
            match e.status() {
                Some(status) => RagError::embedding(PROVIDER, Some(status.as_u16()), message),
                None => RagError::embedding_transport(PROVIDER, message),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embedding(PROVIDER, Some(status.as_u16()), detail));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embedding(PROVIDER, None, format!("failed to parse response: {e}"))
        })?;

        Ok(into_indexed(embedding_response))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
