//! HTTP client for the upstream blog posts API.

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::application::upstream::{PostSource, UpstreamError};
use crate::config::UpstreamSettings;
use crate::domain::posts::PostCollection;

use super::error::InfraError;

pub(crate) const METRIC_UPSTREAM_FETCH: &str = "tagfeed_upstream_fetch_total";
pub(crate) const METRIC_UPSTREAM_ERROR: &str = "tagfeed_upstream_error_total";

/// Fetches a tag's posts with `GET <endpoint>?<tag_param>=<tag>`.
///
/// Retryable failures are attempted again up to `max_retries` times, waiting
/// `retry_backoff` before the first retry and doubling after each one.
#[derive(Debug, Clone)]
pub struct HttpPostSource {
    client: Client,
    endpoint: Url,
    tag_param: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpPostSource {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::http_client(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            tag_param: settings.tag_param.clone(),
            max_retries: settings.max_retries,
            retry_backoff: settings.retry_backoff,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tagfeed/", env!("CARGO_PKG_VERSION"))
    }

    pub fn url_for(&self, tag: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(&self.tag_param, tag);
        url
    }

    async fn fetch_once(&self, tag: &str) -> Result<PostCollection, UpstreamError> {
        counter!(METRIC_UPSTREAM_FETCH).increment(1);

        let response = self
            .client
            .get(self.url_for(tag))
            .send()
            .await
            .map_err(|err| UpstreamError::transport(tag, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                tag: tag.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| UpstreamError::transport(tag, err))?;
        serde_json::from_slice(&body).map_err(|err| UpstreamError::decode(tag, err))
    }
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn fetch_tag(&self, tag: &str) -> Result<PostCollection, UpstreamError> {
        let mut backoff = self.retry_backoff;
        let mut attempt = 0;

        loop {
            match self.fetch_once(tag).await {
                Ok(posts) => {
                    debug!(tag, attempt, posts = posts.len(), "upstream tag fetched");
                    return Ok(posts);
                }
                Err(err) => {
                    counter!(METRIC_UPSTREAM_ERROR).increment(1);
                    if attempt >= self.max_retries || !err.is_retryable() {
                        return Err(err);
                    }
                    warn!(
                        tag,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "upstream fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: &str) -> UpstreamSettings {
        UpstreamSettings {
            endpoint: Url::parse(endpoint).expect("valid url"),
            tag_param: "tag".to_string(),
            request_timeout: Duration::from_secs(1),
            max_retries: 0,
            retry_backoff: Duration::from_millis(10),
        }
    }

    #[test]
    fn url_carries_tag_parameter() {
        let source =
            HttpPostSource::new(&settings("https://example.com/blog/posts")).expect("client");
        assert_eq!(
            source.url_for("tech").as_str(),
            "https://example.com/blog/posts?tag=tech"
        );
    }

    #[test]
    fn url_encodes_tag_and_keeps_existing_query() {
        let source = HttpPostSource::new(&settings("https://example.com/posts?v=2"))
            .expect("client");
        assert_eq!(
            source.url_for("c++ & rust").as_str(),
            "https://example.com/posts?v=2&tag=c%2B%2B+%26+rust"
        );
        assert_eq!(
            source.url_for("").as_str(),
            "https://example.com/posts?v=2&tag="
        );
    }
}
