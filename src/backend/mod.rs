pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Timeout for vote server requests
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Failures at the vote server boundary
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("vote server unreachable: {0}")]
    Network(String),
    #[error("result could not be loaded: {0}")]
    AssetLoad(String),
}

/// One weighted word in a rendered cloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudWord {
    pub text: String,
    pub weight: u32,
}

/// The renderable word-cloud asset for one language, as produced by the
/// server from the cumulative tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultCloud {
    pub language: String,
    #[serde(default)]
    pub words: Vec<CloudWord>,
}

/// Operations the kiosk invokes on the vote server.
///
/// A trait rather than free functions so the controller tests can inject a
/// fake server; the real implementation is [`http::HttpBackend`].
#[async_trait]
pub trait VoteBackend: Send + Sync + 'static {
    /// Record one vote for the three selected keys.
    async fn submit_vote(&self, keys: &[String; 3]) -> Result<(), BackendError>;

    /// Generate the word-cloud asset for one language ahead of display.
    /// Called once per language per transition.
    async fn precompute_result(
        &self,
        keys: &[String; 3],
        language: &str,
    ) -> Result<(), BackendError>;

    /// Finalize the precomputed assets as the ones to display. Best-effort:
    /// the kiosk shows the result even if this step fails.
    async fn commit_result(&self) -> Result<(), BackendError>;

    /// Retrieve the display asset for a language.
    async fn fetch_result_asset(&self, language: &str) -> Result<ResultCloud, BackendError>;

    /// Resolve the display-text catalog for a language.
    async fn translations(&self, language: &str)
        -> Result<HashMap<String, String>, BackendError>;
}
