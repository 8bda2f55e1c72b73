//! Project CRUD guarded by the access control list.
//!
//! Creating a project grants its owner access. Deleting one removes the ACL
//! entries of every user who could see it. Both run in a single transaction
//! so no project lacks its owner's entry and no entry outlives its project.

use crate::errors::ApiError;
use crate::models::{NewProject, Project, ProjectChanges, ResourceType};
use crate::repositories::CredentialStore;
use crate::services::access_control_service::AccessControlService;
use std::sync::Arc;
use tracing::instrument;

pub struct ProjectService<S: CredentialStore> {
    store: Arc<S>,
    acl: AccessControlService<S>,
}

impl<S: CredentialStore> Clone for ProjectService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            acl: self.acl.clone(),
        }
    }
}

fn project_not_found() -> ApiError {
    ApiError::NotFound("Project not found".to_string())
}

impl<S: CredentialStore> ProjectService<S> {
    pub fn new(store: Arc<S>, acl: AccessControlService<S>) -> Self {
        Self { store, acl }
    }

    #[instrument(skip_all, fields(user_id = user_id))]
    pub async fn create(&self, user_id: i32, project: NewProject) -> Result<Project, ApiError> {
        let mut tx = self.store.begin().await?;

        let project = self
            .store
            .insert_project(Some(&mut tx), user_id, &project)
            .await?;
        self.acl
            .grant_access(Some(&mut tx), user_id, ResourceType::Project, project.id)
            .await?;

        self.store.commit(tx).await?;

        tracing::info!(target: "api.service.project", project_id = project.id, "Project created");
        Ok(project)
    }

    #[instrument(skip_all, fields(user_id = user_id, project_id = project_id))]
    pub async fn get(&self, user_id: i32, project_id: i32) -> Result<Project, ApiError> {
        self.acl
            .check_access(None, user_id, ResourceType::Project, project_id)
            .await?;

        self.store
            .find_project(None, project_id)
            .await?
            .ok_or_else(project_not_found)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<Project>, ApiError> {
        self.store.list_projects_for_user(user_id).await
    }

    #[instrument(skip_all, fields(user_id = user_id, project_id = project_id))]
    pub async fn update(
        &self,
        user_id: i32,
        project_id: i32,
        changes: ProjectChanges,
    ) -> Result<Project, ApiError> {
        self.acl
            .check_access(None, user_id, ResourceType::Project, project_id)
            .await?;

        self.store
            .update_project(None, project_id, &changes)
            .await?
            .ok_or_else(project_not_found)
    }

    #[instrument(skip_all, fields(user_id = user_id, project_id = project_id))]
    pub async fn delete(&self, user_id: i32, project_id: i32) -> Result<(), ApiError> {
        let mut tx = self.store.begin().await?;

        self.acl
            .check_access(Some(&mut tx), user_id, ResourceType::Project, project_id)
            .await?;
        self.acl
            .revoke_access(Some(&mut tx), user_id, ResourceType::Project, project_id)
            .await?;
        let shared_with = self
            .store
            .delete_acl_for_resource(Some(&mut tx), ResourceType::Project, project_id)
            .await?;
        let deleted = self.store.delete_project(Some(&mut tx), project_id).await?;

        // Grants are cleared even when the row is already gone
        self.store.commit(tx).await?;

        if !deleted {
            return Err(project_not_found());
        }

        tracing::info!(target: "api.service.project", shared_with, "Project deleted");
        Ok(())
    }
}
