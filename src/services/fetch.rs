// src/services/fetch.rs

//! Topic page fetching.
//!
//! One pooled client is built per invocation and reused across the whole
//! batch. Network-level failures never surface as errors; they are
//! classified as transient outcomes and counted against the batch budget
//! by the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{FetcherConfig, TopicId};

/// Outcome of a single topic fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Page body decoded as UTF-8 text.
    Success(String),

    /// Timeout, connection failure or a similar retryable-class error.
    /// Carries a short human-readable reason for logs and admin alerts.
    Transient(String),
}

/// Seam for fetching topic pages, so batch passes can be exercised
/// without a live forum.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, topic_id: TopicId) -> FetchOutcome;
}

/// HTTP fetcher for forum topic pages.
pub struct TopicFetcher {
    client: Client,
    base_url: String,
}

impl TopicFetcher {
    /// Create a fetcher with a pooled client built from the configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the topic page for the given id.
    pub fn topic_url(&self, topic_id: TopicId) -> String {
        format!("{}/viewtopic.php?t={}", self.base_url, topic_id)
    }

    fn classify(error: reqwest::Error) -> FetchOutcome {
        let reason = if error.is_timeout() {
            "timeout".to_string()
        } else if error.is_connect() {
            "connection error".to_string()
        } else {
            format!("request error: {}", error)
        };
        FetchOutcome::Transient(reason)
    }
}

#[async_trait]
impl Fetcher for TopicFetcher {
    /// Fetch a topic page. Never returns `Err` for network failures.
    async fn fetch(&self, topic_id: TopicId) -> FetchOutcome {
        let url = self.topic_url(topic_id);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return Self::classify(e),
        };

        match response.text().await {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) => Self::classify(e),
        }
    }
}
