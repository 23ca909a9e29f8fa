//! Remote abuse list
//!
//! The list is a plain-text file with one conversation id per line. It is
//! fetched on every check; lines are trimmed and compared exactly.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use relaygate_core::ConversationId;
use relaygate_relay::{AbuseList, AbuseListError};

use crate::Result;

pub struct HttpAbuseList {
    http: reqwest::Client,
    url: String,
}

impl HttpAbuseList {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AbuseList for HttpAbuseList {
    async fn is_flagged(&self, id: &ConversationId) -> std::result::Result<bool, AbuseListError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AbuseListError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AbuseListError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AbuseListError::Unreachable(e.to_string()))?;
        let flagged = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .any(|line| line == id.as_str());

        debug!("Abuse list check for {}: {}", id, flagged);
        Ok(flagged)
    }
}
