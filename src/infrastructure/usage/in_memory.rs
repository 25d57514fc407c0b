//! In-memory usage repository

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::{UsageQuery, UsageRecord, UsageRecordId, UsageRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Ledger {
    records: HashMap<UsageRecordId, UsageRecord>,
    /// Ids in insertion order, oldest at the front
    order: VecDeque<UsageRecordId>,
}

impl Ledger {
    fn insert(&mut self, record: UsageRecord, max_records: usize) {
        let id = *record.id();
        if self.records.insert(id, record).is_none() {
            self.order.push_back(id);
        }

        while self.records.len() > max_records {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.records.remove(&oldest);
        }
    }
}

/// In-memory usage repository with a bounded record count.
/// Past the bound the earliest written records are dropped first.
#[derive(Debug)]
pub struct InMemoryUsageRepository {
    ledger: RwLock<Ledger>,
    max_records: usize,
}

impl InMemoryUsageRepository {
    /// Create a new in-memory usage repository
    pub fn new(max_records: usize) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            max_records,
        }
    }
}

impl Default for InMemoryUsageRepository {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError> {
        let mut ledger = self.ledger.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        ledger.insert(record, self.max_records);

        Ok(())
    }

    async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageRecord>, DomainError> {
        let ledger = self.ledger.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(ledger
            .records
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    async fn count_by_key(
        &self,
        since: DateTime<Utc>,
    ) -> Result<HashMap<ApiKeyId, u64>, DomainError> {
        let ledger = self.ledger.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut counts = HashMap::new();
        for record in ledger.records.values().filter(|r| r.timestamp >= since) {
            *counts.entry(record.key_id).or_insert(0) += 1;
        }

        Ok(counts)
    }
}
