//! OpenAI-compatible embedding provider over `/embeddings`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::LlmConfig;

pub struct OpenAiEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
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

impl OpenAiEmbeddingProvider {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build embeddings HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dim,
        })
    }
}

impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
                dimensions: self.dimensions,
            })
            .send()
            .context("embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("embedding API returned HTTP {}: {body}", status.as_u16());
        }

        let parsed: EmbeddingResponse = response
            .json()
            .context("failed to decode embedding response")?;
        order_embeddings(parsed, texts.len(), self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Put vectors back in input order and check their shape.
fn order_embeddings(
    response: EmbeddingResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    anyhow::ensure!(
        response.data.len() == expected,
        "embedding API returned {} vectors for {expected} inputs",
        response.data.len()
    );

    let mut data = response.data;
    data.sort_by_key(|d| d.index);

    data.into_iter()
        .map(|d| {
            anyhow::ensure!(
                d.embedding.len() == dimensions,
                "embedding has {} dimensions, expected {dimensions}",
                d.embedding.len()
            );
            Ok(d.embedding)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn vectors_are_reordered_by_index() {
        let parsed = response(
            r#"{"object":"list","data":[
                {"object":"embedding","index":1,"embedding":[0.0,1.0]},
                {"object":"embedding","index":0,"embedding":[1.0,0.0]}
            ],"model":"m"}"#,
        );
        let vectors = order_embeddings(parsed, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn wrong_dimension_is_an_error() {
        let parsed = response(r#"{"data":[{"index":0,"embedding":[1.0,0.0,0.0]}]}"#);
        assert!(order_embeddings(parsed, 1, 2).is_err());
    }

    #[test]
    fn missing_vectors_is_an_error() {
        let parsed = response(r#"{"data":[]}"#);
        assert!(order_embeddings(parsed, 1, 2).is_err());
    }
}
