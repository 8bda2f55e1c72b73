//! ACL repository module.
//!
//! The `acl` table has no surrogate key: `(user_id, resource_type,
//! resource_id)` is the primary key, so a second insert of the same tuple
//! fails with a unique violation.

use crate::errors::ApiError;
use crate::models::{AclEntry, ResourceType};
use sqlx::PgExecutor;

pub async fn insert<'e, E>(executor: E, entry: &AclEntry) -> Result<(), ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO acl (user_id, resource_type, resource_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.resource_type.as_str())
    .bind(entry.resource_id)
    .execute(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to insert ACL entry", e))?;

    Ok(())
}

pub async fn exists<'e, E>(executor: E, entry: &AclEntry) -> Result<bool, ApiError>
where
    E: PgExecutor<'e>,
{
    let exists: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM acl
            WHERE user_id = $1 AND resource_type = $2 AND resource_id = $3
        )
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.resource_type.as_str())
    .bind(entry.resource_id)
    .fetch_one(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to check ACL entry", e))?;

    Ok(exists.0)
}

/// Delete an entry. Returns `false` when it did not exist.
pub async fn delete<'e, E>(executor: E, entry: &AclEntry) -> Result<bool, ApiError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM acl
        WHERE user_id = $1 AND resource_type = $2 AND resource_id = $3
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.resource_type.as_str())
    .bind(entry.resource_id)
    .execute(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to delete ACL entry", e))?;

    Ok(result.rows_affected() == 1)
}

/// Delete the entries of all users for one resource.
pub async fn delete_for_resource<'e, E>(
    executor: E,
    resource_type: ResourceType,
    resource_id: i32,
) -> Result<u64, ApiError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM acl
        WHERE resource_type = $1 AND resource_id = $2
        "#,
    )
    .bind(resource_type.as_str())
    .bind(resource_id)
    .execute(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to delete ACL entries for resource", e))?;

    Ok(result.rows_affected())
}
