//! PostgreSQL API key repository over the `api_keys` table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::api_key::{ActiveFilter, ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::DomainError;

const SELECT_COLUMNS: &str =
    "id, name, key_prefix, key_hash, active, created_at, last_used, user_id";

/// PostgreSQL implementation of ApiKeyRepository
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_api_key(row: &PgRow) -> Result<ApiKey, DomainError> {
    let decode = |e: sqlx::Error| DomainError::storage(format!("Failed to decode api_keys row: {}", e));

    let id: Uuid = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let key_prefix: String = row.try_get("key_prefix").map_err(decode)?;
    let key_hash: String = row.try_get("key_hash").map_err(decode)?;
    let active: bool = row.try_get("active").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let last_used: Option<DateTime<Utc>> = row.try_get("last_used").map_err(decode)?;
    let user_id: Option<String> = row.try_get("user_id").map_err(decode)?;

    let mut key = ApiKey::new(ApiKeyId::from_uuid(id), name, key_prefix, key_hash)
        .with_created_at(created_at)
        .with_active(active)
        .with_last_used_at(last_used);

    if let Some(user_id) = user_id {
        key = key.with_user_id(user_id);
    }

    Ok(key)
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, key_prefix, key_hash, active, created_at, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(api_key.id().as_uuid())
        .bind(api_key.name())
        .bind(api_key.key_prefix())
        .bind(api_key.key_hash())
        .bind(api_key.is_active())
        .bind(api_key.created_at())
        .bind(api_key.user_id())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to insert API key: {}", e)))?;

        Ok(api_key)
    }

    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let query = format!("SELECT {} FROM api_keys WHERE id = $1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn find_by_credential(
        &self,
        prefix: &str,
        key_hash: &str,
        filter: ActiveFilter,
    ) -> Result<Option<ApiKey>, DomainError> {
        let active_clause = match filter {
            ActiveFilter::Any => "",
            ActiveFilter::ActiveOnly => " AND active = TRUE",
        };
        let query = format!(
            "SELECT {} FROM api_keys WHERE key_prefix = $1 AND key_hash = $2{} LIMIT 1",
            SELECT_COLUMNS, active_clause
        );

        let row = sqlx::query(&query)
            .bind(prefix)
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<ApiKey>, DomainError> {
        let where_clause = if include_inactive {
            ""
        } else {
            " WHERE active = TRUE"
        };
        let query = format!(
            "SELECT {} FROM api_keys{} ORDER BY created_at DESC",
            SELECT_COLUMNS, where_clause
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn deactivate(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE api_keys SET active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to deactivate API key: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn touch_last_used(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE api_keys SET last_used = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update last_used: {}", e)))?;

        Ok(())
    }
}
