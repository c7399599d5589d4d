// PostgreSQL store implementation - one row per link, shared by any number
// of clients. Last write wins on concurrent settles; there is no version
// column and no optimistic check.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::LinkStore;
use crate::error::StoreError;
use crate::model::{CreateLinkInput, Currency, PaymentLink};

/// PostgreSQL store backend
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get pool reference (for callers that need raw queries, e.g. tests)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Idempotent schema setup. `seq` records insertion order so listings
    /// come back in the order links were created.
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payment_links (
                seq BIGSERIAL,
                id UUID PRIMARY KEY,
                recipient TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                message TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                created_by TEXT,
                paid BOOLEAN NOT NULL DEFAULT FALSE,
                paid_at TIMESTAMPTZ,
                paid_by TEXT,
                tx_hash TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS payment_links_creator_idx ON payment_links (LOWER(created_by))",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

type LinkRow = (
    Uuid,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    Option<String>,
    bool,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<String>,
);

fn row_to_link(row: LinkRow) -> Result<PaymentLink, StoreError> {
    let (id, recipient, amount, currency, message, created_at, created_by, paid, paid_at, paid_by, tx_hash) =
        row;
    Ok(PaymentLink {
        id,
        recipient,
        amount,
        currency: Currency::from_str(&currency)?,
        message,
        created_at,
        created_by,
        paid,
        paid_at,
        paid_by,
        tx_hash,
    })
}

const LINK_COLUMNS: &str =
    "id, recipient, amount, currency, message, created_at, created_by, paid, paid_at, paid_by, tx_hash";

#[async_trait]
impl LinkStore for PostgresStore {
    async fn create(
        &self,
        input: CreateLinkInput,
        created_by: Option<String>,
    ) -> Result<PaymentLink, StoreError> {
        input.validate()?;

        let link = PaymentLink::issue(input, created_by);
        sqlx::query(
            r#"
            INSERT INTO payment_links (
                id, recipient, amount, currency, message,
                created_at, created_by, paid, paid_at, paid_by, tx_hash
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(link.id)
        .bind(&link.recipient)
        .bind(&link.amount)
        .bind(link.currency.as_str())
        .bind(&link.message)
        .bind(link.created_at)
        .bind(&link.created_by)
        .bind(link.paid)
        .bind(link.paid_at)
        .bind(&link.paid_by)
        .bind(&link.tx_hash)
        .execute(&self.pool)
        .await?;

        Ok(link)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PaymentLink>, StoreError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {} FROM payment_links WHERE id = $1",
            LINK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_link).transpose()
    }

    async fn get_all(&self) -> Result<Vec<PaymentLink>, StoreError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {} FROM payment_links ORDER BY seq ASC",
            LINK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_link).collect()
    }

    async fn get_by_creator(&self, address: &str) -> Result<Vec<PaymentLink>, StoreError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {} FROM payment_links WHERE created_by IS NOT NULL AND LOWER(created_by) = LOWER($1) ORDER BY seq ASC",
            LINK_COLUMNS
        ))
        .bind(address)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_link).collect()
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        paid_by: &str,
        tx_hash: &str,
    ) -> Result<Option<PaymentLink>, StoreError> {
        // Single statement so the four paid fields land together. No
        // `paid = FALSE` guard: re-settling overwrites, see DESIGN.md.
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            UPDATE payment_links
            SET paid = TRUE, paid_at = $2, paid_by = $3, tx_hash = $4
            WHERE id = $1
            RETURNING {}
            "#,
            LINK_COLUMNS
        ))
        .bind(id)
        .bind(Utc::now())
        .bind(paid_by)
        .bind(tx_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_link).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
