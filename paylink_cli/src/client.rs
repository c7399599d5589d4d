use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    pub id: String,
    pub recipient: String,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_by: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    pub link: PaymentLink,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub recipient: String,
    pub amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

pub struct PaylinkApi {
    client: Client,
    base_url: String,
}

impl PaylinkApi {
    /// Create new client with custom URL
    pub fn new(url: Option<String>) -> Self {
        PaylinkApi {
            client: Client::new(),
            base_url: url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    /// Create a payment-request link
    pub fn create_link(&self, request: &CreateLinkRequest) -> Result<CreatedLink> {
        let url = format!("{}/links", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| anyhow!("Failed to create link: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status, error_text));
        }

        response
            .json()
            .map_err(|e| anyhow!("Failed to parse create response: {}", e))
    }

    /// List links, optionally filtered by creator address
    pub fn list_links(&self, creator: Option<&str>) -> Result<Vec<PaymentLink>> {
        let url = format!("{}/links", self.base_url);

        let mut req = self.client.get(&url);
        if let Some(creator) = creator {
            req = req.query(&[("creator", creator)]);
        }

        let response = req
            .send()
            .map_err(|e| anyhow!("Failed to list links: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status, error_text));
        }

        response
            .json()
            .map_err(|e| anyhow!("Failed to parse link list: {}", e))
    }

    /// Fetch one link by id
    pub fn get_link(&self, id: &str) -> Result<PaymentLink> {
        let url = format!("{}/links/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| anyhow!("Failed to fetch link: {}", e))?;

        if response.status().as_u16() == 404 {
            return Err(anyhow!("Link {} does not exist", id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status, error_text));
        }

        response
            .json()
            .map_err(|e| anyhow!("Failed to parse link: {}", e))
    }

    /// Report a completed transfer for a link
    pub fn mark_paid(&self, id: &str, paid_by: &str, tx_hash: &str) -> Result<PaymentLink> {
        let url = format!("{}/links/{}/pay", self.base_url, id);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "paidBy": paid_by, "txHash": tx_hash }))
            .send()
            .map_err(|e| anyhow!("Failed to mark link paid: {}", e))?;

        if response.status().as_u16() == 404 {
            return Err(anyhow!("Link {} does not exist", id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("API error {}: {}", status, error_text));
        }

        response
            .json()
            .map_err(|e| anyhow!("Failed to parse pay response: {}", e))
    }

    /// Health check
    pub fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| anyhow!("Failed to connect to server: {}", e))?;

        Ok(response.status().is_success())
    }
}
