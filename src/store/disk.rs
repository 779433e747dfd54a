use crate::core::quota::{QuotaDecision, QuotaRecord, QuotaStore, apply_increment};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Quota counters persisted in a fjall partition as JSON records keyed by subject id.
///
/// The partition has no compare-and-swap, so updates are serialized through `write_lock`
/// to keep the increment atomic for this process.
pub struct DiskQuotaStore {
    _keyspace: Keyspace,
    partition: PartitionHandle,
    write_lock: Mutex<()>,
}

impl DiskQuotaStore {
    pub const PARTITION: &'static str = "quota";

    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(Self::PARTITION, PartitionCreateOptions::default())
            .context("Failed to open quota partition")?;
        Ok(Self {
            _keyspace: keyspace,
            partition,
            write_lock: Mutex::new(()),
        })
    }

    fn read(&self, subject_id: &str) -> Result<Option<QuotaRecord>> {
        let Some(bytes) = self
            .partition
            .get(subject_id)
            .context("Failed to read quota record")?
        else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt quota record for {subject_id}"))?;
        Ok(Some(record))
    }
}

#[async_trait]
impl QuotaStore for DiskQuotaStore {
    async fn increment_if_below(
        &self,
        subject_id: &str,
        day_key: NaiveDate,
        limit: u32,
    ) -> Result<QuotaDecision> {
        let _guard = self.write_lock.lock().await;
        let existing = self.read(subject_id)?;
        let decision = apply_increment(existing, subject_id, day_key, limit);
        if let QuotaDecision::Allowed(record) = &decision {
            self.partition
                .insert(subject_id, serde_json::to_vec(record)?)
                .context("Failed to write quota record")?;
        }
        debug!("Quota UPDATE for subject: {:?}", subject_id);
        Ok(decision)
    }

    async fn get(&self, subject_id: &str) -> Result<Option<QuotaRecord>> {
        self.read(subject_id)
    }

    async fn reset(&self, subject_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.partition
            .remove(subject_id)
            .context("Failed to remove quota record")?;
        debug!("Quota RESET for subject: {:?}", subject_id);
        Ok(())
    }
}
