//! PostgreSQL-backed credential store.

use super::{acl, projects, users, CredentialStore};
use crate::errors::ApiError;
use crate::models::{
    AclEntry, NewProject, Project, ProjectChanges, ResourceType, User, UserUpdate,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, ApiError> {
        self.pool
            .begin()
            .await
            .map_err(|e| ApiError::from_sqlx("Failed to begin transaction", e))
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), ApiError> {
        tx.commit()
            .await
            .map_err(|e| ApiError::from_sqlx("Failed to commit transaction", e))
    }

    async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ApiError::from_sqlx("Database ping failed", e))?;
        Ok(())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError> {
        users::create_user(&self.pool, username, password_hash).await
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        users::get_by_id(&self.pool, id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        users::get_by_username(&self.pool, username).await
    }

    async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<Option<User>, ApiError> {
        users::update_user(&self.pool, id, update).await
    }

    async fn set_api_key_hash(&self, id: i32, api_key_hash: &str) -> Result<bool, ApiError> {
        users::set_api_key(&self.pool, id, api_key_hash).await
    }

    async fn insert_acl(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<(), ApiError> {
        match tx {
            Some(tx) => acl::insert(&mut **tx, entry).await,
            None => acl::insert(&self.pool, entry).await,
        }
    }

    async fn acl_exists(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<bool, ApiError> {
        match tx {
            Some(tx) => acl::exists(&mut **tx, entry).await,
            None => acl::exists(&self.pool, entry).await,
        }
    }

    async fn delete_acl(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<bool, ApiError> {
        match tx {
            Some(tx) => acl::delete(&mut **tx, entry).await,
            None => acl::delete(&self.pool, entry).await,
        }
    }

    async fn delete_acl_for_resource(
        &self,
        tx: Option<&mut Self::Tx>,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<u64, ApiError> {
        match tx {
            Some(tx) => acl::delete_for_resource(&mut **tx, resource_type, resource_id).await,
            None => acl::delete_for_resource(&self.pool, resource_type, resource_id).await,
        }
    }

    async fn insert_project(
        &self,
        tx: Option<&mut Self::Tx>,
        user_id: i32,
        project: &NewProject,
    ) -> Result<Project, ApiError> {
        match tx {
            Some(tx) => projects::create_project(&mut **tx, user_id, project).await,
            None => projects::create_project(&self.pool, user_id, project).await,
        }
    }

    async fn find_project(
        &self,
        tx: Option<&mut Self::Tx>,
        id: i32,
    ) -> Result<Option<Project>, ApiError> {
        match tx {
            Some(tx) => projects::get_by_id(&mut **tx, id).await,
            None => projects::get_by_id(&self.pool, id).await,
        }
    }

    async fn list_projects_for_user(&self, user_id: i32) -> Result<Vec<Project>, ApiError> {
        projects::list_accessible(&self.pool, user_id).await
    }

    async fn update_project(
        &self,
        tx: Option<&mut Self::Tx>,
        id: i32,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, ApiError> {
        match tx {
            Some(tx) => projects::update_project(&mut **tx, id, changes).await,
            None => projects::update_project(&self.pool, id, changes).await,
        }
    }

    async fn delete_project(&self, tx: Option<&mut Self::Tx>, id: i32) -> Result<bool, ApiError> {
        match tx {
            Some(tx) => projects::delete_project(&mut **tx, id).await,
            None => projects::delete_project(&self.pool, id).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_dropped_transaction_rolls_back(pool: PgPool) -> Result<(), ApiError> {
        let store = PgStore::new(pool);
        let user = store.insert_user("alice", "hash").await?;

        {
            let mut tx = store.begin().await?;
            let project = store
                .insert_project(
                    Some(&mut tx),
                    user.id,
                    &NewProject {
                        name: "Ghost".to_string(),
                        description: None,
                    },
                )
                .await?;
            store
                .insert_acl(
                    Some(&mut tx),
                    &AclEntry::new(user.id, ResourceType::Project, project.id),
                )
                .await?;
            // dropped without commit
        }

        assert!(store.list_projects_for_user(user.id).await?.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_committed_transaction_is_visible(pool: PgPool) -> Result<(), ApiError> {
        let store = PgStore::new(pool);
        let user = store.insert_user("bob", "hash").await?;

        let mut tx = store.begin().await?;
        let project = store
            .insert_project(
                Some(&mut tx),
                user.id,
                &NewProject {
                    name: "Real".to_string(),
                    description: Some("kept".to_string()),
                },
            )
            .await?;
        store
            .insert_acl(
                Some(&mut tx),
                &AclEntry::new(user.id, ResourceType::Project, project.id),
            )
            .await?;
        store.commit(tx).await?;

        let listed = store.list_projects_for_user(user.id).await?;
        assert_eq!(listed, vec![project]);
        store.ping().await?;
        Ok(())
    }
}
