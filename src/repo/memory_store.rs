use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::repo::payments_repo::{PaymentStore, TransitionUpdate};

/// In-memory store with the same compare-and-set contract as the Postgres
/// repo. Backs the integration tests.
#[derive(Default)]
pub struct MemoryPaymentStore {
    records: Mutex<HashMap<Uuid, PaymentRecord>>,
}

impl MemoryPaymentStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn save(&self, record: &PaymentRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());

        // Same uniqueness guarantee as the payments_external_intent_id_key
        // index: one record per external intent.
        let duplicate = records.values().any(|existing| {
            existing.external_intent_id == record.external_intent_id
                && existing.payment_id != record.payment_id
        });
        if duplicate {
            anyhow::bail!("duplicate external intent id {}", record.external_intent_id);
        }

        records.insert(record.payment_id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(&payment_id).cloned())
    }

    async fn find_by_external_intent_id(
        &self,
        external_intent_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .values()
            .find(|r| r.external_intent_id == external_intent_id)
            .cloned())
    }

    async fn apply_transition(
        &self,
        payment_id: Uuid,
        expected: PaymentStatus,
        update: &TransitionUpdate,
    ) -> Result<bool> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let Some(record) = records.get_mut(&payment_id) else {
            return Ok(false);
        };
        if record.status != expected {
            return Ok(false);
        }

        record.status = update.next;
        record.attempt = update.attempt;
        if update.failure_reason.is_some() {
            record.failure_reason = update.failure_reason.clone();
        }
        record.updated_at = Utc::now();
        Ok(true)
    }
}
