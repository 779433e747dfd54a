//! Per-subject daily call budget.
//!
//! Counting happens through a single increment-if-below primitive on the store, so
//! concurrent requests from one subject cannot both pass the last free slot.

use super::error::LimitError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub subject_id: String,
    pub day_key: NaiveDate,
    pub calls_made: u32,
    pub limit: u32,
}

impl QuotaRecord {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.calls_made)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed(QuotaRecord),
    Denied(QuotaRecord),
}

/// Storage for quota counters.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Atomically bumps the subject's counter for `day_key` when it is below `limit`.
    async fn increment_if_below(
        &self,
        subject_id: &str,
        day_key: NaiveDate,
        limit: u32,
    ) -> Result<QuotaDecision>;

    async fn get(&self, subject_id: &str) -> Result<Option<QuotaRecord>>;

    async fn reset(&self, subject_id: &str) -> Result<()>;
}

/// The counter transition shared by every store: a stale day counts as zero.
pub fn apply_increment(
    existing: Option<QuotaRecord>,
    subject_id: &str,
    day_key: NaiveDate,
    limit: u32,
) -> QuotaDecision {
    let calls_made = existing
        .filter(|record| record.day_key == day_key)
        .map_or(0, |record| record.calls_made);

    let mut record = QuotaRecord {
        subject_id: subject_id.to_string(),
        day_key,
        calls_made,
        limit,
    };
    if calls_made >= limit {
        QuotaDecision::Denied(record)
    } else {
        record.calls_made += 1;
        QuotaDecision::Allowed(record)
    }
}

pub struct QuotaGate {
    store: Arc<dyn QuotaStore>,
    reference_offset: FixedOffset,
}

impl QuotaGate {
    /// Day boundaries are computed at `reference_offset`, not the caller's local zone.
    pub fn new(store: Arc<dyn QuotaStore>, reference_offset: FixedOffset) -> Self {
        Self {
            store,
            reference_offset,
        }
    }

    pub fn day_key(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.reference_offset).date_naive()
    }

    pub async fn try_consume(&self, subject_id: &str, limit: u32) -> Result<QuotaRecord> {
        self.try_consume_at(subject_id, limit, Utc::now()).await
    }

    /// Consumes one call for the subject, or fails with [`LimitError::QuotaExhausted`].
    pub async fn try_consume_at(
        &self,
        subject_id: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<QuotaRecord> {
        let day_key = self.day_key(now);
        match self
            .store
            .increment_if_below(subject_id, day_key, limit)
            .await?
        {
            QuotaDecision::Allowed(record) => {
                debug!(
                    subject = subject_id,
                    %day_key,
                    calls = record.calls_made,
                    limit,
                    "Quota consumed"
                );
                Ok(record)
            }
            QuotaDecision::Denied(record) => {
                debug!(
                    subject = subject_id,
                    %day_key,
                    calls = record.calls_made,
                    limit,
                    "Quota exhausted"
                );
                Err(LimitError::QuotaExhausted {
                    subject: subject_id.to_string(),
                    limit,
                }
                .into())
            }
        }
    }

    /// Today's usage without consuming anything.
    pub async fn usage(&self, subject_id: &str, limit: u32) -> Result<QuotaRecord> {
        self.usage_at(subject_id, limit, Utc::now()).await
    }

    pub async fn usage_at(
        &self,
        subject_id: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<QuotaRecord> {
        let day_key = self.day_key(now);
        let calls_made = self
            .store
            .get(subject_id)
            .await?
            .filter(|record| record.day_key == day_key)
            .map_or(0, |record| record.calls_made);
        Ok(QuotaRecord {
            subject_id: subject_id.to_string(),
            day_key,
            calls_made,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LimitError;
    use crate::store::memory::MemoryQuotaStore;
    use chrono::TimeZone;

    fn gate(offset_hours: i32) -> QuotaGate {
        QuotaGate::new(
            Arc::new(MemoryQuotaStore::new()),
            FixedOffset::east_opt(offset_hours * 3600).unwrap(),
        )
    }

    #[test]
    fn test_apply_increment_transitions() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let first = apply_increment(None, "u1", today, 2);
        assert!(matches!(&first, QuotaDecision::Allowed(r) if r.calls_made == 1));

        let full = QuotaRecord {
            subject_id: "u1".into(),
            day_key: today,
            calls_made: 2,
            limit: 2,
        };
        assert!(matches!(
            apply_increment(Some(full.clone()), "u1", today, 2),
            QuotaDecision::Denied(_)
        ));

        let stale = QuotaRecord {
            day_key: yesterday,
            ..full
        };
        assert!(matches!(
            apply_increment(Some(stale), "u1", today, 2),
            QuotaDecision::Allowed(r) if r.calls_made == 1 && r.day_key == today
        ));

        assert!(matches!(
            apply_increment(None, "u1", today, 0),
            QuotaDecision::Denied(r) if r.calls_made == 0
        ));
    }

    #[tokio::test]
    async fn test_never_allows_more_than_limit_in_a_day() {
        let gate = gate(0);
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

        let mut allowed = 0;
        for _ in 0..10 {
            match gate.try_consume_at("alice", 3, now).await {
                Ok(_) => allowed += 1,
                Err(e) => assert!(matches!(
                    e.downcast_ref::<LimitError>(),
                    Some(LimitError::QuotaExhausted { limit: 3, .. })
                )),
            }
        }
        assert_eq!(allowed, 3);
        assert_eq!(gate.usage_at("alice", 3, now).await.unwrap().remaining(), 0);

        // Another subject has its own budget.
        assert!(gate.try_consume_at("bob", 3, now).await.is_ok());
    }

    #[tokio::test]
    async fn test_rolls_over_on_new_day() {
        let gate = gate(0);
        let day1 = Utc.with_ymd_and_hms(2024, 5, 2, 23, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 5, 3, 1, 0, 0).unwrap();

        assert!(gate.try_consume_at("alice", 1, day1).await.is_ok());
        assert!(gate.try_consume_at("alice", 1, day1).await.is_err());
        let record = gate.try_consume_at("alice", 1, day2).await.unwrap();
        assert_eq!(record.calls_made, 1);
    }

    #[tokio::test]
    async fn test_day_key_uses_reference_offset() {
        // UTC-5: 03:00 UTC is still the previous day.
        let gate = gate(-5);
        let now = Utc.with_ymd_and_hms(2024, 5, 3, 3, 0, 0).unwrap();
        assert_eq!(gate.day_key(now), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    #[tokio::test]
    async fn test_limit_resolved_at_check_time() {
        let gate = gate(0);
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

        assert!(gate.try_consume_at("alice", 1, now).await.is_ok());
        assert!(gate.try_consume_at("alice", 1, now).await.is_err());
        // Tier upgrade mid-day raises the limit immediately.
        let record = gate.try_consume_at("alice", 5, now).await.unwrap();
        assert_eq!(record.calls_made, 2);
        assert_eq!(record.limit, 5);
    }

    #[tokio::test]
    async fn test_concurrent_consumers_cannot_overrun() {
        let gate = Arc::new(gate(0));
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.try_consume_at("tabs", 5, now).await.is_ok() })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }
}
