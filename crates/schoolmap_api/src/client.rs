//! HTTP client for the listing endpoint.

use crate::models::{ErrorResponse, ListSchoolsResponse};
use async_trait::async_trait;
use log::{debug, warn};
use schoolmap_core::{PageRequest, SchoolListing, SchoolSource, SourceError};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches school pages from a running directory server.
#[derive(Debug, Clone)]
pub struct SchoolsClient {
    http: reqwest::Client,
    base_url: String,
}

impl SchoolsClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn listing_url(&self, request: PageRequest) -> String {
        format!(
            "{}/api/schools?limit={}&skip={}",
            self.base_url, request.limit, request.skip
        )
    }
}

#[async_trait]
impl SchoolSource for SchoolsClient {
    async fn fetch_schools(&self, request: PageRequest) -> Result<SchoolListing, SourceError> {
        let url = self.listing_url(request);
        debug!("event=schools_fetch module=client status=start url={url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .map(|envelope| envelope.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            warn!(
                "event=schools_fetch module=client status=error code={} error={}",
                status.as_u16(),
                message
            );
            return Err(SourceError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let envelope: ListSchoolsResponse =
            serde_json::from_slice(&body).map_err(|err| SourceError::Decode(err.to_string()))?;
        if !envelope.success {
            return Err(SourceError::Decode("response flagged unsuccessful".to_string()));
        }
        Ok(envelope.listing)
    }
}
