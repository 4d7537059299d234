//! Remote classifier endpoint client.
//!
//! Speaks a small JSON protocol to a configured HTTP endpoint. Pipeline code
//! never constructs this type directly; it is wired in at the CLI boundary
//! behind the `CommentClassifier` trait.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

use super::classifier::{Classification, CommentClassifier};

/// HTTP-backed classifier.
pub struct RemoteClassifier {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl RemoteClassifier {
    /// Create a new remote classifier.
    ///
    /// The API key falls back to the `RIPPLE_CLASSIFIER_API_KEY` environment
    /// variable when not provided.
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::classifier(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            api_key: api_key.or_else(|| env::var("RIPPLE_CLASSIFIER_API_KEY").ok()),
            timeout,
            client,
        })
    }
}

#[derive(Serialize)]
struct ClassifyHttpRequest<'a> {
    comment: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct ClassifyHttpResponse {
    is_satd: bool,
    confidence: f64,
}

impl CommentClassifier for RemoteClassifier {
    fn classify(&self, comment: &str, context: &str) -> Result<Classification> {
        if comment.trim().is_empty() {
            return Ok(Classification {
                is_satd: false,
                confidence: 0.0,
                error: None,
            });
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyHttpRequest { comment, context });
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                Error::ClassifierTimeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                Error::classifier(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().unwrap_or_default();
            return Err(Error::ClassifierRateLimit(body));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::classifier(format!(
                "endpoint error ({status}): {body}"
            )));
        }

        let parsed: ClassifyHttpResponse = response
            .json()
            .map_err(|e| Error::classifier(format!("failed to parse response: {e}")))?;

        Ok(Classification {
            is_satd: parsed.is_satd,
            confidence: parsed.confidence.clamp(0.0, 1.0),
            error: None,
        })
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
