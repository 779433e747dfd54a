use crate::core::quota::{QuotaDecision, QuotaRecord, QuotaStore, apply_increment};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory quota counters. The whole read-modify-write happens under one lock.
#[derive(Clone, Default)]
pub struct MemoryQuotaStore {
    inner: Arc<Mutex<HashMap<String, QuotaRecord>>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn increment_if_below(
        &self,
        subject_id: &str,
        day_key: NaiveDate,
        limit: u32,
    ) -> Result<QuotaDecision> {
        let mut records = self.inner.lock().await;
        let existing = records.get(subject_id).cloned();
        let decision = apply_increment(existing, subject_id, day_key, limit);
        if let QuotaDecision::Allowed(record) = &decision {
            records.insert(subject_id.to_string(), record.clone());
        }
        debug!("Quota UPDATE for subject: {:?}", subject_id);
        Ok(decision)
    }

    async fn get(&self, subject_id: &str) -> Result<Option<QuotaRecord>> {
        let records = self.inner.lock().await;
        Ok(records.get(subject_id).cloned())
    }

    async fn reset(&self, subject_id: &str) -> Result<()> {
        let mut records = self.inner.lock().await;
        records.remove(subject_id);
        debug!("Quota RESET for subject: {:?}", subject_id);
        Ok(())
    }
}
