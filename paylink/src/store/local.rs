// src/store/local.rs
// sled-backed local realization: the whole collection lives in one named
// slot, read in full and rewritten in full (then flushed) on every mutation.
// Mirrors the single-slot layout a browser-local deployment uses.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use super::LinkStore;
use crate::error::StoreError;
use crate::model::{CreateLinkInput, PaymentLink};

/// Slot key holding the JSON-encoded ordered sequence of links.
const LINKS_KEY: &str = "paylink_links";

pub struct LocalStore {
    db: sled::Db,
    // Serializes the slot's read-modify-write. Only one browsing context
    // touches the local realization in practice, but two tasks in this
    // process must not interleave a rewrite.
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Open with retry/backoff (helps on transient locks left by a previous
    /// process that is still shutting down).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let mut attempt = 0u32;
        let max_attempts = 8u32;
        let mut wait = 250u64;
        let db = loop {
            match sled::open(path) {
                Ok(db) => break db,
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(StoreError::Local(e));
                    }
                    warn!(
                        "open attempt {}/{} failed for '{}': {}, retrying in {}ms",
                        attempt, max_attempts, path, e, wait
                    );
                    std::thread::sleep(Duration::from_millis(wait));
                    wait = std::cmp::min(wait * 2, 2000);
                }
            }
        };
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn read_links(&self) -> Result<Vec<PaymentLink>, StoreError> {
        match self.db.get(LINKS_KEY)? {
            Some(ivec) => Ok(serde_json::from_slice(&ivec)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_links(&self, links: &[PaymentLink]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(links)?;
        self.db.insert(LINKS_KEY, bytes)?;
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl LinkStore for LocalStore {
    async fn create(
        &self,
        input: CreateLinkInput,
        created_by: Option<String>,
    ) -> Result<PaymentLink, StoreError> {
        input.validate()?;

        let _guard = self.write_lock.lock();
        let mut links = self.read_links()?;
        let link = PaymentLink::issue(input, created_by);
        links.push(link.clone());
        self.write_links(&links)?;
        Ok(link)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PaymentLink>, StoreError> {
        let links = self.read_links()?;
        Ok(links.into_iter().find(|l| l.id == id))
    }

    async fn get_all(&self) -> Result<Vec<PaymentLink>, StoreError> {
        self.read_links()
    }

    async fn get_by_creator(&self, address: &str) -> Result<Vec<PaymentLink>, StoreError> {
        let links = self.read_links()?;
        Ok(links
            .into_iter()
            .filter(|l| l.created_by_matches(address))
            .collect())
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        paid_by: &str,
        tx_hash: &str,
    ) -> Result<Option<PaymentLink>, StoreError> {
        let _guard = self.write_lock.lock();
        let mut links = self.read_links()?;
        let index = match links.iter().position(|l| l.id == id) {
            Some(i) => i,
            None => return Ok(None),
        };
        links[index].settle(paid_by, tx_hash);
        self.write_links(&links)?;
        Ok(Some(links[index].clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.get(LINKS_KEY)?;
        Ok(())
    }
}
