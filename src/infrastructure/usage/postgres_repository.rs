//! PostgreSQL usage repository over the `api_usage` table

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::domain::api_key::ApiKeyId;
use crate::domain::usage::{UsageQuery, UsageRecord, UsageRecordId, UsageRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of UsageRepository
#[derive(Debug, Clone)]
pub struct PostgresUsageRepository {
    pool: PgPool,
}

impl PostgresUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &PgRow) -> Result<UsageRecord, DomainError> {
    let decode = |e: sqlx::Error| DomainError::storage(format!("Failed to decode api_usage row: {}", e));

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let key_id: Uuid = row.try_get("key_id").map_err(decode)?;
    let endpoint: String = row.try_get("endpoint").map_err(decode)?;
    let method: String = row.try_get("method").map_err(decode)?;
    let status_code: i32 = row.try_get("status_code").map_err(decode)?;
    let response_time_ms: i64 = row.try_get("response_time_ms").map_err(decode)?;
    let ip_address: String = row.try_get("ip_address").map_err(decode)?;
    let user_agent: String = row.try_get("user_agent").map_err(decode)?;
    let timestamp: DateTime<Utc> = row.try_get("timestamp").map_err(decode)?;

    let status_code = u16::try_from(status_code)
        .map_err(|_| DomainError::storage(format!("Invalid status code in api_usage: {}", status_code)))?;

    Ok(
        UsageRecord::new(ApiKeyId::from_uuid(key_id), endpoint, method, status_code)
            .with_id(UsageRecordId::from_uuid(id))
            .with_response_time_ms(response_time_ms.max(0) as u64)
            .with_ip_address(ip_address)
            .with_user_agent(user_agent)
            .with_timestamp(timestamp),
    )
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn record(&self, record: UsageRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO api_usage
                (id, key_id, endpoint, method, status_code, response_time_ms, ip_address, user_agent, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.key_id.as_uuid())
        .bind(&record.endpoint)
        .bind(&record.method)
        .bind(i32::from(record.status_code))
        .bind(i64::try_from(record.response_time_ms).unwrap_or(i64::MAX))
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to insert usage record: {}", e)))?;

        Ok(())
    }

    async fn query(&self, query: &UsageQuery) -> Result<Vec<UsageRecord>, DomainError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, key_id, endpoint, method, status_code, response_time_ms, \
             ip_address, user_agent, timestamp FROM api_usage WHERE TRUE",
        );

        if let Some(key_id) = &query.key_id {
            builder.push(" AND key_id = ").push_bind(*key_id.as_uuid());
        }

        if let Some(since) = query.since {
            builder.push(" AND timestamp >= ").push_bind(since);
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query usage records: {}", e)))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn count_by_key(
        &self,
        since: DateTime<Utc>,
    ) -> Result<HashMap<ApiKeyId, u64>, DomainError> {
        let rows = sqlx::query(
            "SELECT key_id, COUNT(*) AS requests FROM api_usage WHERE timestamp >= $1 GROUP BY key_id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to count usage by key: {}", e)))?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            let key_id: Uuid = row.try_get("key_id")?;
            let requests: i64 = row.try_get("requests")?;
            counts.insert(ApiKeyId::from_uuid(key_id), requests.max(0) as u64);
        }

        Ok(counts)
    }
}
