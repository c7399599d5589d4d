// src/model.rs
// Payment link record and lifecycle helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::StoreError;

/// Display tag for the requested amount. No conversion logic exists anywhere;
/// a USD link still settles as whatever transfer the payer's wallet produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eth,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eth => "ETH",
            Currency::Usd => "USD",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, StoreError> {
        match s {
            "ETH" => Ok(Currency::Eth),
            "USD" => Ok(Currency::Usd),
            other => Err(StoreError::Malformed(format!("unknown currency '{}'", other))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted payment request. Unpaid until settled exactly once through the
/// store's mark-paid operation; the paid fields travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    pub id: Uuid,
    pub recipient: String,
    pub amount: String,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl PaymentLink {
    /// Construct a fresh unpaid link. Both store backends go through here so
    /// id, timestamp and initial state are assigned in exactly one place.
    pub fn issue(input: CreateLinkInput, created_by: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: input.recipient,
            amount: input.amount,
            currency: input.currency,
            message: input.message,
            created_at: Utc::now(),
            created_by,
            paid: false,
            paid_at: None,
            paid_by: None,
            tx_hash: None,
        }
    }

    /// Flip to the paid state. paid, paid_at, paid_by and tx_hash are set
    /// together; callers never set any of them individually.
    pub fn settle(&mut self, paid_by: &str, tx_hash: &str) {
        self.paid = true;
        self.paid_at = Some(Utc::now());
        self.paid_by = Some(paid_by.to_string());
        self.tx_hash = Some(tx_hash.to_string());
    }

    /// Case-insensitive creator match. Addresses differing only in hex
    /// letter case are the same account.
    pub fn created_by_matches(&self, address: &str) -> bool {
        self.created_by
            .as_deref()
            .map(|c| c.to_lowercase() == address.to_lowercase())
            .unwrap_or(false)
    }
}

/// Caller-supplied fields for a new link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkInput {
    pub recipient: String,
    pub amount: String,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CreateLinkInput {
    /// Required-field check only. Address and amount format are the calling
    /// boundary's job; the store never constructs a record missing either.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.recipient.trim().is_empty() {
            return Err(StoreError::Validation("recipient is required".into()));
        }
        if self.amount.trim().is_empty() {
            return Err(StoreError::Validation("amount is required".into()));
        }
        Ok(())
    }
}

/// Shareable URL for a link: `<base>/pay/<id>`. Display-only, never parsed back.
pub fn payment_url(base_url: &str, id: Uuid) -> String {
    format!("{}/pay/{}", base_url.trim_end_matches('/'), id)
}
