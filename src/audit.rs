//! Audit trail for state-changing operations.
//!
//! Writes are best effort: a failed insert is logged and the calling request
//! carries on.

use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

pub async fn record(pool: &DbPool, user_id: Uuid, action: &str, resource: &str, metadata: Value) {
    if let Err(err) = insert(pool, user_id, action, resource, &metadata).await {
        tracing::warn!(
            error = %err,
            user_id = %user_id,
            action,
            resource,
            "audit log failed"
        );
    }
}

async fn insert(
    pool: &DbPool,
    user_id: Uuid,
    action: &str,
    resource: &str,
    metadata: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(())
}
