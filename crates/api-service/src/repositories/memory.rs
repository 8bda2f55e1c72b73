//! In-memory credential store for tests.
//!
//! Mirrors the constraints of the SQL schema (unique username, unique API-key
//! hash, ACL primary key, user foreign keys) so services see the same errors
//! they would against PostgreSQL.
//!
//! A transaction holds the table lock for its whole lifetime and rolls back
//! to a snapshot when dropped uncommitted. Calling a `None`-scoped operation
//! on the same store while holding a transaction in the same task deadlocks.

use super::CredentialStore;
use crate::errors::ApiError;
use crate::models::{AclEntry, NewProject, Project, ProjectChanges, ResourceType, User, UserUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    projects: BTreeMap<i32, Project>,
    acl: BTreeSet<AclEntry>,
    last_user_id: i32,
    last_project_id: i32,
}

fn violation(constraint: &str) -> ApiError {
    ApiError::ConstraintViolation(constraint.to_string())
}

impl Tables {
    fn insert_user(&mut self, username: &str, password_hash: &str) -> Result<User, ApiError> {
        if self.users.values().any(|u| u.username == username) {
            return Err(violation("users_username_key"));
        }

        self.last_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: self.last_user_id,
            username: username.to_string(),
            password: password_hash.to_string(),
            api_key: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&mut self, id: i32, update: &UserUpdate) -> Result<Option<User>, ApiError> {
        if let Some(username) = &update.username {
            if self
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(violation("users_username_key"));
            }
        }

        let Some(user) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = &update.username {
            user.username.clone_from(username);
        }
        if let Some(hash) = &update.password_hash {
            user.password.clone_from(hash);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    fn set_api_key_hash(&mut self, id: i32, api_key_hash: &str) -> Result<bool, ApiError> {
        if self
            .users
            .values()
            .any(|u| u.id != id && u.api_key.as_deref() == Some(api_key_hash))
        {
            return Err(violation("users_api_key_key"));
        }

        let Some(user) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        user.api_key = Some(api_key_hash.to_string());
        user.updated_at = Utc::now();
        Ok(true)
    }

    fn insert_acl(&mut self, entry: &AclEntry) -> Result<(), ApiError> {
        if !self.users.contains_key(&entry.user_id) {
            return Err(violation("acl_user_id_fkey"));
        }
        if !self.acl.insert(*entry) {
            return Err(violation("acl_pkey"));
        }
        Ok(())
    }

    fn delete_acl_for_resource(&mut self, resource_type: ResourceType, resource_id: i32) -> u64 {
        let before = self.acl.len();
        self.acl
            .retain(|e| !(e.resource_type == resource_type && e.resource_id == resource_id));
        (before - self.acl.len()) as u64
    }

    fn insert_project(&mut self, user_id: i32, project: &NewProject) -> Result<Project, ApiError> {
        if !self.users.contains_key(&user_id) {
            return Err(violation("projects_user_id_fkey"));
        }

        self.last_project_id += 1;
        let now = Utc::now();
        let project = Project {
            id: self.last_project_id,
            user_id,
            name: project.name.clone(),
            description: project.description.clone(),
            created_at: now,
            updated_at: now,
        };
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn list_projects_for_user(&self, user_id: i32) -> Vec<Project> {
        self.projects
            .values()
            .filter(|p| {
                self.acl
                    .contains(&AclEntry::new(user_id, ResourceType::Project, p.id))
            })
            .cloned()
            .collect()
    }

    fn update_project(&mut self, id: i32, changes: &ProjectChanges) -> Option<Project> {
        let project = self.projects.get_mut(&id)?;
        if let Some(name) = &changes.name {
            project.name.clone_from(name);
        }
        if let Some(description) = &changes.description {
            project.description = Some(description.clone());
        }
        project.updated_at = Utc::now();
        Some(project.clone())
    }
}

/// Credential store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Transaction over a [`MemoryStore`].
pub struct MemoryTx {
    tables: OwnedMutexGuard<Tables>,
    snapshot: Option<Tables>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.tables = snapshot;
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, ApiError> {
        let tables = Arc::clone(&self.tables).lock_owned().await;
        let snapshot = Some(tables.clone());
        Ok(MemoryTx { tables, snapshot })
    }

    async fn commit(&self, mut tx: Self::Tx) -> Result<(), ApiError> {
        tx.snapshot = None;
        Ok(())
    }

    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError> {
        self.tables.lock().await.insert_user(username, password_hash)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, ApiError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .tables
            .lock()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, id: i32, update: &UserUpdate) -> Result<Option<User>, ApiError> {
        self.tables.lock().await.update_user(id, update)
    }

    async fn set_api_key_hash(&self, id: i32, api_key_hash: &str) -> Result<bool, ApiError> {
        self.tables.lock().await.set_api_key_hash(id, api_key_hash)
    }

    async fn insert_acl(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<(), ApiError> {
        match tx {
            Some(tx) => tx.tables.insert_acl(entry),
            None => self.tables.lock().await.insert_acl(entry),
        }
    }

    async fn acl_exists(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<bool, ApiError> {
        Ok(match tx {
            Some(tx) => tx.tables.acl.contains(entry),
            None => self.tables.lock().await.acl.contains(entry),
        })
    }

    async fn delete_acl(
        &self,
        tx: Option<&mut Self::Tx>,
        entry: &AclEntry,
    ) -> Result<bool, ApiError> {
        Ok(match tx {
            Some(tx) => tx.tables.acl.remove(entry),
            None => self.tables.lock().await.acl.remove(entry),
        })
    }

    async fn delete_acl_for_resource(
        &self,
        tx: Option<&mut Self::Tx>,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<u64, ApiError> {
        Ok(match tx {
            Some(tx) => tx.tables.delete_acl_for_resource(resource_type, resource_id),
            None => self
                .tables
                .lock()
                .await
                .delete_acl_for_resource(resource_type, resource_id),
        })
    }

    async fn insert_project(
        &self,
        tx: Option<&mut Self::Tx>,
        user_id: i32,
        project: &NewProject,
    ) -> Result<Project, ApiError> {
        match tx {
            Some(tx) => tx.tables.insert_project(user_id, project),
            None => self.tables.lock().await.insert_project(user_id, project),
        }
    }

    async fn find_project(
        &self,
        tx: Option<&mut Self::Tx>,
        id: i32,
    ) -> Result<Option<Project>, ApiError> {
        Ok(match tx {
            Some(tx) => tx.tables.projects.get(&id).cloned(),
            None => self.tables.lock().await.projects.get(&id).cloned(),
        })
    }

    async fn list_projects_for_user(&self, user_id: i32) -> Result<Vec<Project>, ApiError> {
        Ok(self.tables.lock().await.list_projects_for_user(user_id))
    }

    async fn update_project(
        &self,
        tx: Option<&mut Self::Tx>,
        id: i32,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, ApiError> {
        Ok(match tx {
            Some(tx) => tx.tables.update_project(id, changes),
            None => self.tables.lock().await.update_project(id, changes),
        })
    }

    async fn delete_project(&self, tx: Option<&mut Self::Tx>, id: i32) -> Result<bool, ApiError> {
        Ok(match tx {
            Some(tx) => tx.tables.projects.remove(&id).is_some(),
            None => self.tables.lock().await.projects.remove(&id).is_some(),
        })
    }
}
