//! Project repository module.

use crate::errors::ApiError;
use crate::models::{NewProject, Project, ProjectChanges};
use sqlx::PgExecutor;

pub async fn create_project<'e, E>(
    executor: E,
    user_id: i32,
    project: &NewProject,
) -> Result<Project, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Project>(
        r#"
        INSERT INTO projects (user_id, name, description)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, description, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&project.name)
    .bind(project.description.as_deref())
    .fetch_one(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to create project", e))
}

pub async fn get_by_id<'e, E>(executor: E, id: i32) -> Result<Option<Project>, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Project>(
        r#"
        SELECT id, user_id, name, description, created_at, updated_at
        FROM projects
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to fetch project", e))
}

/// Projects the user holds an ACL entry for, ordered by id.
pub async fn list_accessible<'e, E>(executor: E, user_id: i32) -> Result<Vec<Project>, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Project>(
        r#"
        SELECT p.id, p.user_id, p.name, p.description, p.created_at, p.updated_at
        FROM projects p
        JOIN acl a
            ON a.resource_type = 'Project' AND a.resource_id = p.id
        WHERE a.user_id = $1
        ORDER BY p.id
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to list projects", e))
}

pub async fn update_project<'e, E>(
    executor: E,
    id: i32,
    changes: &ProjectChanges,
) -> Result<Option<Project>, ApiError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Project>(
        r#"
        UPDATE projects
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, user_id, name, description, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.description.as_deref())
    .fetch_optional(executor)
    .await
    .map_err(|e| ApiError::from_sqlx("Failed to update project", e))
}

/// Returns `false` when no row has this id.
pub async fn delete_project<'e, E>(executor: E, id: i32) -> Result<bool, ApiError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| ApiError::from_sqlx("Failed to delete project", e))?;

    Ok(result.rows_affected() == 1)
}
