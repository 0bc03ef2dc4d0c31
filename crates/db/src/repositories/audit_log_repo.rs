//! Repository for the `audit_logs` table.
//!
//! Entries form a SHA-256 hash chain: each row's integrity hash covers its
//! canonical content plus the previous row's hash. Appends serialise on the
//! table via an advisory lock so the chain never forks under concurrency.

use sqlx::PgPool;
use staffhub_core::audit;
use staffhub_core::types::DbId;

use crate::models::audit_log::{AuditLog, CreateAuditLog};

const AUDIT_COLUMNS: &str = "\
    id, actor_id, action_type, category, entity_type, entity_id, details, \
    integrity_hash, created_at";

/// Advisory lock key reserved for audit chain appends.
const AUDIT_CHAIN_LOCK: i64 = 0x5741_4c4f_4755; // arbitrary constant

pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry to the chain.
    pub async fn append(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(AUDIT_CHAIN_LOCK)
            .execute(&mut *tx)
            .await?;

        let prev_hash: Option<String> = sqlx::query_scalar(
            "SELECT integrity_hash FROM audit_logs ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        let details_canonical = input
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let entry_data = format!(
            "{}|{}|{}|{}|{}",
            input
                .actor_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "system".to_string()),
            input.action_type,
            input.entity_type,
            input.entity_id,
            details_canonical,
        );
        let hash = audit::compute_integrity_hash(prev_hash.as_deref(), &entry_data);
        let category = audit::action_to_category(input.action_type);

        let query = format!(
            "INSERT INTO audit_logs \
                 (actor_id, action_type, category, entity_type, entity_id, details, integrity_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {AUDIT_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.actor_id)
            .bind(input.action_type)
            .bind(category)
            .bind(input.entity_type)
            .bind(input.entity_id)
            .bind(&input.details)
            .bind(&hash)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// List entries for one entity, oldest first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs \
             WHERE entity_type = $1 AND entity_id = $2 ORDER BY id"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }

    /// Recompute the whole chain and return the id of the first tampered
    /// entry, or `None` when everything verifies.
    pub async fn verify_chain(pool: &PgPool) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!("SELECT {AUDIT_COLUMNS} FROM audit_logs ORDER BY id");
        let rows = sqlx::query_as::<_, AuditLog>(&query).fetch_all(pool).await?;

        let entries: Vec<(String, String)> = rows
            .iter()
            .map(|row| {
                let details_canonical = row
                    .details
                    .as_ref()
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                let entry_data = format!(
                    "{}|{}|{}|{}|{}",
                    row.actor_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "system".to_string()),
                    row.action_type,
                    row.entity_type,
                    row.entity_id,
                    details_canonical,
                );
                (entry_data, row.integrity_hash.clone())
            })
            .collect();

        Ok(audit::verify_chain(&entries).map(|i| rows[i].id))
    }
}
