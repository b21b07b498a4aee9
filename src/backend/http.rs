//! HTTP client for the vote server.
//!
//! Endpoints mirror the server's API: votes and cloud generation are POSTs,
//! assets and translations are GETs. Every request carries a fixed timeout so
//! a dead server can never wedge the kiosk.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use super::{BackendError, ResultCloud, VoteBackend, REQUEST_TIMEOUT};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct VoteRequest<'a> {
    keys: &'a [String; 3],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    keys: &'a [String; 3],
    language: &'a str,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<(), BackendError> {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VoteBackend for HttpBackend {
    async fn submit_vote(&self, keys: &[String; 3]) -> Result<(), BackendError> {
        tracing::debug!("submitting vote: {:?}", keys);
        self.post_json("/api/vote", &VoteRequest { keys }).await
    }

    async fn precompute_result(
        &self,
        keys: &[String; 3],
        language: &str,
    ) -> Result<(), BackendError> {
        tracing::debug!("precomputing cloud for language {language}");
        self.post_json("/api/cloud/generate", &GenerateRequest { keys, language })
            .await
    }

    async fn commit_result(&self) -> Result<(), BackendError> {
        self.client
            .post(self.url("/api/cloud/commit"))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(())
    }

    async fn fetch_result_asset(&self, language: &str) -> Result<ResultCloud, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/api/cloud/{language}")))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| BackendError::AssetLoad(e.to_string()))?;

        response
            .json::<ResultCloud>()
            .await
            .map_err(|e| BackendError::AssetLoad(e.to_string()))
    }

    async fn translations(
        &self,
        language: &str,
    ) -> Result<HashMap<String, String>, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/api/translations/{language}")))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        response
            .json::<HashMap<String, String>>()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let backend = HttpBackend::new("http://localhost:5000/");
        assert_eq!(backend.url("/api/vote"), "http://localhost:5000/api/vote");
    }
}
