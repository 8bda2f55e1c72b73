//! User repository module for database operations.
//!
//! Functions take any Postgres executor, so they run either directly on the
//! pool or inside a caller's transaction.

use crate::errors::ApiError;
use crate::models::{User, UserUpdate};
use sqlx::PgExecutor;

/// Insert a new user. The username unique constraint surfaces as
/// `ApiError::ConstraintViolation`.
pub async fn create_user<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
) -> Result<User, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password)
        VALUES ($1, $2)
        RETURNING id, username, password, api_key, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to create user", e))
}

/// Get user by primary key.
pub async fn get_by_id<'e, E>(executor: E, id: i32) -> Result<Option<User>, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, api_key, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to fetch user by id", e))
}

/// Get user by username (unique).
pub async fn get_by_username<'e, E>(executor: E, username: &str) -> Result<Option<User>, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, api_key, created_at, updated_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to fetch user by username", e))
}

/// Apply a partial update. Returns `None` when no row has this id.
pub async fn update_user<'e, E>(
    executor: E,
    id: i32,
    update: &UserUpdate,
) -> Result<Option<User>, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET username = COALESCE($2, username),
            password = COALESCE($3, password),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, username, password, api_key, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(update.username.as_deref())
    .bind(update.password_hash.as_deref())
    .fetch_optional(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to update user", e))
}

/// Replace the stored API-key hash in a single statement, so the previous
/// key stops working the moment the new one is written.
///
/// Returns `false` when no row has this id.
pub async fn set_api_key<'e, E>(executor: E, id: i32, api_key_hash: &str) -> Result<bool, ApiError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET api_key = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(api_key_hash)
    .execute(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to update API key", e))?;

    Ok(result.rows_affected() == 1)
}
