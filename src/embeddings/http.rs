//! HTTP embedding provider for OpenAI-style `/embeddings` endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::types::RetrievalError;

/// Provider backed by an OpenAI-compatible embeddings endpoint.
///
/// The API token is held as an opaque secret and attached as a bearer
/// header per request. Every request carries the configured timeout —
/// the provider boundary is the pipeline's only unbounded suspension
/// point, so it is the one place a hard bound is mandatory.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    config: EmbeddingConfig,
}

impl HttpEmbeddingProvider {
    /// Build a provider with its own HTTP client.
    pub fn new(config: EmbeddingConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Build a provider over an injected client (shared connection
    /// pools, test instrumentation). The per-request timeout still
    /// applies.
    #[must_use]
    pub fn with_client(client: Client, config: EmbeddingConfig) -> Self {
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));
        Self {
            client,
            endpoint,
            config,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn id(&self) -> &str {
        &self.config.model
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.config.model, batch = texts.len(), "requesting embeddings");

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimensions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_token)
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RetrievalError::Provider(format!(
                "embedding request failed ({status}): {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(RetrievalError::Provider(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        for entry in &parsed.data {
            if entry.embedding.len() != self.config.dimensions {
                return Err(RetrievalError::Provider(format!(
                    "provider returned {}-dimensional vector, expected {}",
                    entry.embedding.len(),
                    self.config.dimensions
                )));
            }
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(base_url: String) -> EmbeddingConfig {
        EmbeddingConfig::new("sk-test")
            .model("test-embedder")
            .dimensions(3)
            .base_url(base_url)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn embeds_batch_in_input_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embeddings")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"model": "test-embedder", "dimensions": 3}"#);
                then.status(200).json_body(json!({
                    "data": [
                        // Out of order on purpose; the client must sort.
                        {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                        {"index": 0, "embedding": [1.0, 0.0, 0.0]},
                    ],
                }));
            })
            .await;

        let provider =
            HttpEmbeddingProvider::new(config(server.base_url())).unwrap();
        let vectors = provider
            .embed_batch(&texts(&["first", "second"]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
    }

    #[tokio::test]
    async fn auth_failure_surfaces_as_provider_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(401).body("invalid api key");
            })
            .await;

        let provider =
            HttpEmbeddingProvider::new(config(server.base_url())).unwrap();
        let err = provider.embed_batch(&texts(&["x"])).await.unwrap_err();

        match err {
            RetrievalError::Provider(message) => {
                assert!(message.contains("401"), "got: {message}");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({
                    "data": [{"index": 0, "embedding": [0.5, 0.5, 0.5]}],
                }));
            })
            .await;

        let provider =
            HttpEmbeddingProvider::new(config(server.base_url())).unwrap();
        let err = provider
            .embed_batch(&texts(&["one", "two"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Provider(_)));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({
                    "data": [{"index": 0, "embedding": [0.5, 0.5]}],
                }));
            })
            .await;

        let provider =
            HttpEmbeddingProvider::new(config(server.base_url())).unwrap();
        let err = provider.embed_batch(&texts(&["one"])).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Provider(_)));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network() {
        // No mock registered: any request would fail the test.
        let provider = HttpEmbeddingProvider::new(config(
            "http://127.0.0.1:1".to_string(),
        ))
        .unwrap();
        let vectors = provider.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
