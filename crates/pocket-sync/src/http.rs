//! HTTP implementation of the remote collaborator.

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::error::SyncError;
use crate::remote::{RemoteCollaborator, RemotePayload, RemoteRecord};

/// Talks to a REST collection over HTTP(S).
///
/// No retries and no timeout beyond the client defaults.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpCollaborator {
    /// Build a collaborator for a collection URL such as
    /// `https://<id>.mockapi.io/api/v1/transactions`.
    pub fn new(endpoint: &str) -> Result<Self, SyncError> {
        let endpoint = validate_endpoint(endpoint)?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// `<endpoint>/<id>` with the id percent-encoded as one path segment.
    fn item_url(&self, id: &str) -> Result<Url, SyncError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SyncError::InvalidEndpoint(format!("'{}' cannot take a path", self.endpoint))
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

/// Trim the endpoint and require an `http://` or `https://` URL.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, SyncError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(SyncError::InvalidEndpoint(
            "no endpoint configured".to_string(),
        ));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| SyncError::InvalidEndpoint(format!("'{}': {}", trimmed, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SyncError::InvalidEndpoint(format!(
            "'{}' is not an http(s) URL",
            trimmed
        )));
    }
    Ok(url)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteCollaborator for HttpCollaborator {
    async fn fetch_all(&self) -> Result<Vec<RemoteRecord>, SyncError> {
        debug!(endpoint = %self.endpoint, "GET");
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let records: Vec<RemoteRecord> = check_status(response).await?.json().await?;
        Ok(records)
    }

    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let url = self.item_url(id)?;
        debug!(url = %url, "DELETE");
        let response = self.client.delete(url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn create(&self, payload: &RemotePayload) -> Result<RemoteRecord, SyncError> {
        debug!(endpoint = %self.endpoint, title = %payload.title, "POST");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;
        let record: RemoteRecord = check_status(response).await?.json().await?;
        Ok(record)
    }
}
