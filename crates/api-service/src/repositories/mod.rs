//! Data access layer.
//!
//! Services talk to the credential store through [`CredentialStore`]. The
//! PostgreSQL implementation delegates to the per-table modules below; the
//! in-memory implementation backs unit and integration tests.
//!
//! Operations that can take part in a multi-statement unit of work accept an
//! explicit `Option<&mut Self::Tx>`: `None` runs the statement on its own,
//! `Some(tx)` runs it inside the caller's transaction.

pub mod acl;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;
pub mod projects;
pub mod users;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::ApiError;
use crate::models::{
    AclEntry, NewProject, Project, ProjectChanges, ResourceType, User, UserUpdate,
};
use async_trait::async_trait;

/// Narrow data-access interface over the User, Project and ACL tables.
///
/// Unique and foreign-key violations surface as
/// `ApiError::ConstraintViolation`; other storage failures as
/// `ApiError::Database`.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Transaction handle. Dropping it without [`commit`](Self::commit)
    /// rolls the transaction back.
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, ApiError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), ApiError>;

    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> Result<(), ApiError>;

    // Users

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, ApiError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;

    async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<Option<User>, ApiError>;

    /// Overwrite the stored API-key hash. Returns `false` for an unknown id.
    async fn set_api_key_hash(&self, id: i32, api_key_hash: &str) -> Result<bool, ApiError>;

    // ACL

    async fn insert_acl(&self, tx: Option<&mut Self::Tx>, entry: &AclEntry)
        -> Result<(), ApiError>;

    async fn acl_exists(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<bool, ApiError>;

    /// Returns `false` when the entry did not exist.
    async fn delete_acl(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<bool, ApiError>;

    /// Remove every user's entry for one resource. Returns the number removed.
    async fn delete_acl_for_resource(
        &self,
        tx: Option<&mut Self::Tx>,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<u64, ApiError>;

    // Projects

    async fn insert_project(
        &self,
        tx: Option<&mut Self::Tx>,
        user_id: i32,
        project: &NewProject,
    ) -> Result<Project, ApiError>;

    async fn find_project(
        &self,
        tx: Option<&mut Self::Tx>,
        id: i32,
    ) -> Result<Option<Project>, ApiError>;

    /// Projects `user_id` holds an ACL entry for, ordered by id.
    async fn list_projects_for_user(&self, user_id: i32) -> Result<Vec<Project>, ApiError>;

    async fn update_project(
        &self,
        tx: Option<&mut Self::Tx>,
        id: i32,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, ApiError>;

    async fn delete_project(&self, tx: Option<&mut Self::Tx>, id: i32) -> Result<bool, ApiError>;
}
