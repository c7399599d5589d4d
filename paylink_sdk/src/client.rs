use crate::error::{Result, SdkError};
use crate::types::*;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Main client for talking to a paylink server
#[derive(Clone)]
pub struct PaylinkClient {
    base_url: String,
    client: Client,
}

impl PaylinkClient {
    /// Create a new client
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            base_url: server_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a client with a custom reqwest client
    pub fn with_client(server_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: server_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a payment-request link; returns the record and shareable URL
    pub async fn create_link(&self, request: &CreateLinkRequest) -> Result<CreatedLink> {
        let url = format!("{}/links", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        decode(response).await
    }

    /// Fetch a single link by id
    pub async fn link(&self, id: Uuid) -> Result<PaymentLink> {
        let url = format!("{}/links/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Fetch every link the server knows
    pub async fn links(&self) -> Result<Vec<PaymentLink>> {
        let url = format!("{}/links", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Fetch links created by the given address (case-insensitive match)
    pub async fn links_by_creator(&self, address: &str) -> Result<Vec<PaymentLink>> {
        let url = format!("{}/links", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("creator", address)])
            .send()
            .await?;
        decode(response).await
    }

    /// Report a completed transfer; the server settles the link
    pub async fn mark_paid(&self, id: Uuid, request: &MarkPaidRequest) -> Result<PaymentLink> {
        let url = format!("{}/links/{}/pay", self.base_url, id);
        let response = self.client.post(&url).json(request).send().await?;
        decode(response).await
    }

    /// Health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(SdkError::LinkNotFound);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(SdkError::Api {
        status: status.as_u16(),
        message,
    })
}
