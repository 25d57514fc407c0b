//! Usage ledger service
//!
//! Write side is best effort: a failed usage write is logged and swallowed
//! so it can never fail the request being accounted for. Read side scans
//! records inside a trailing window of whole days.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::{UsageQuery, UsageRecord, UsageRepository, UsageStats};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_usage_write_failure;

/// Default reporting window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Widest accepted window, kept inside the range PostgreSQL timestamps can hold
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Trait for the usage ledger
#[async_trait]
pub trait UsageLedgerTrait: Send + Sync + Debug {
    /// Append a record; never fails the caller
    async fn record(&self, record: UsageRecord);

    /// Stats for one key, `None` when it has no records in the window
    async fn stats_for_key(
        &self,
        key_id: &ApiKeyId,
        window_days: u32,
    ) -> Result<Option<UsageStats>, DomainError>;

    /// Stats across all keys, `None` when the window is empty
    async fn overall_stats(&self, window_days: u32) -> Result<Option<UsageStats>, DomainError>;

    /// Request count per key in the window
    async fn all_keys_usage(&self, window_days: u32)
    -> Result<HashMap<ApiKeyId, u64>, DomainError>;
}

/// Usage ledger backed by a usage repository
pub struct UsageLedger {
    repository: Arc<dyn UsageRepository>,
}

impl Debug for UsageLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageLedger").finish_non_exhaustive()
    }
}

impl UsageLedger {
    pub fn new(repository: Arc<dyn UsageRepository>) -> Self {
        Self { repository }
    }
}

/// Start of a trailing window of `days` days
pub fn window_start(window_days: u32) -> Result<DateTime<Utc>, DomainError> {
    if window_days == 0 || window_days > MAX_WINDOW_DAYS {
        return Err(DomainError::validation(format!(
            "days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }

    Utc::now()
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .ok_or_else(|| DomainError::validation("days is out of range"))
}

#[async_trait]
impl UsageLedgerTrait for UsageLedger {
    async fn record(&self, record: UsageRecord) {
        let key_id = record.key_id;
        let status_code = record.status_code;

        match self.repository.record(record).await {
            Ok(()) => debug!(key_id = %key_id, status_code, "Usage recorded"),
            Err(e) => {
                record_usage_write_failure();
                warn!(key_id = %key_id, status_code, error = %e, "Failed to record API usage");
            }
        }
    }

    async fn stats_for_key(
        &self,
        key_id: &ApiKeyId,
        window_days: u32,
    ) -> Result<Option<UsageStats>, DomainError> {
        let query = UsageQuery::new()
            .with_key(*key_id)
            .since(window_start(window_days)?);
        let records = self.repository.query(&query).await?;

        Ok(UsageStats::from_records(&records))
    }

    async fn overall_stats(&self, window_days: u32) -> Result<Option<UsageStats>, DomainError> {
        let query = UsageQuery::new().since(window_start(window_days)?);
        let records = self.repository.query(&query).await?;

        Ok(UsageStats::from_records(&records))
    }

    async fn all_keys_usage(
        &self,
        window_days: u32,
    ) -> Result<HashMap<ApiKeyId, u64>, DomainError> {
        self.repository.count_by_key(window_start(window_days)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage::MockUsageRepository;
    use crate::infrastructure::usage::InMemoryUsageRepository;

    fn create_ledger() -> (UsageLedger, Arc<InMemoryUsageRepository>) {
        let repo = Arc::new(InMemoryUsageRepository::default());
        (UsageLedger::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_stats_for_key_without_records_is_none() {
        let (ledger, _) = create_ledger();
        let other = ApiKeyId::generate();
        ledger.record(UsageRecord::new(other, "/a", "GET", 200)).await;

        let stats = ledger.stats_for_key(&ApiKeyId::generate(), 30).await.unwrap();
        assert!(stats.is_none());
    }

    #[tokio::test]
    async fn test_stats_for_key_filters_by_key_and_window() {
        let (ledger, _) = create_ledger();
        let key = ApiKeyId::generate();

        ledger.record(UsageRecord::new(key, "/a", "GET", 200)).await;
        ledger.record(UsageRecord::new(key, "/a", "GET", 500)).await;
        ledger
            .record(
                UsageRecord::new(key, "/a", "GET", 200)
                    .with_timestamp(Utc::now() - Duration::days(10)),
            )
            .await;
        ledger
            .record(UsageRecord::new(ApiKeyId::generate(), "/a", "GET", 200))
            .await;

        let stats = ledger.stats_for_key(&key, 7).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[tokio::test]
    async fn test_overall_stats() {
        let (ledger, _) = create_ledger();
        assert!(ledger.overall_stats(30).await.unwrap().is_none());

        ledger.record(UsageRecord::new(ApiKeyId::generate(), "/a", "GET", 200)).await;
        ledger.record(UsageRecord::new(ApiKeyId::generate(), "/b", "POST", 201)).await;

        let stats = ledger.overall_stats(30).await.unwrap().unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.success_rate, 100.0);
    }

    #[tokio::test]
    async fn test_all_keys_usage() {
        let (ledger, _) = create_ledger();
        let key = ApiKeyId::generate();

        ledger.record(UsageRecord::new(key, "/a", "GET", 200)).await;
        ledger.record(UsageRecord::new(key, "/a", "GET", 401)).await;

        let counts = ledger.all_keys_usage(30).await.unwrap();
        assert_eq!(counts.get(&key), Some(&2));
    }

    #[tokio::test]
    async fn test_record_swallows_storage_fault() {
        let mut repo = MockUsageRepository::new();
        repo.expect_record()
            .times(1)
            .returning(|_| Err(DomainError::storage("disk full")));
        let ledger = UsageLedger::new(Arc::new(repo));

        ledger
            .record(UsageRecord::new(ApiKeyId::generate(), "/a", "GET", 200))
            .await;
    }

    #[test]
    fn test_window_start_bounds() {
        let start = window_start(7).unwrap();
        let age = Utc::now() - start;
        assert!(age >= Duration::days(7) && age < Duration::days(7) + Duration::minutes(1));

        assert!(window_start(MAX_WINDOW_DAYS).is_ok());
        assert!(matches!(window_start(0), Err(DomainError::Validation { .. })));
        assert!(matches!(
            window_start(MAX_WINDOW_DAYS + 1),
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_huge_window_is_rejected_without_touching_storage() {
        let mut repo = MockUsageRepository::new();
        repo.expect_query().never();
        repo.expect_count_by_key().never();
        let ledger = UsageLedger::new(Arc::new(repo));

        for result in [
            ledger.overall_stats(u32::MAX).await,
            ledger.stats_for_key(&ApiKeyId::generate(), u32::MAX).await,
        ] {
            assert!(matches!(result, Err(DomainError::Validation { .. })));
        }
        assert!(matches!(
            ledger.all_keys_usage(4_000_000_000).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_fault_is_reported() {
        let mut repo = MockUsageRepository::new();
        repo.expect_query()
            .returning(|_| Err(DomainError::storage("timeout")));
        let ledger = UsageLedger::new(Arc::new(repo));

        assert!(ledger.overall_stats(30).await.is_err());
    }
}
