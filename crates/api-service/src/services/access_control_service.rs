//! Access control over `(user, resource type, resource id)` tuples.
//!
//! An entry exists or it does not; there are no roles or permission levels.
//! Granting twice is an error rather than an upsert.

use crate::errors::ApiError;
use crate::models::{AclEntry, ResourceType};
use crate::observability::metrics::record_access_check;
use crate::repositories::CredentialStore;
use std::sync::Arc;
use tracing::instrument;

pub struct AccessControlService<S: CredentialStore> {
    store: Arc<S>,
}

impl<S: CredentialStore> Clone for AccessControlService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CredentialStore> AccessControlService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Grant `user_id` access to the resource.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation` if the entry already exists or the user is unknown
    #[instrument(skip_all, fields(user_id = user_id, resource_type = %resource_type, resource_id = resource_id))]
    pub async fn grant_access(
        &self,
        scope: Option<&mut S::Tx>,
        user_id: i32,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<(), ApiError> {
        let entry = AclEntry::new(user_id, resource_type, resource_id);
        self.store.insert_acl(scope, &entry).await?;

        tracing::debug!(target: "api.service.acl", "Access granted");
        Ok(())
    }

    /// Whether an entry exists. Calling it never changes anything.
    #[instrument(skip_all, fields(user_id = user_id, resource_type = %resource_type, resource_id = resource_id))]
    pub async fn has_access(
        &self,
        scope: Option<&mut S::Tx>,
        user_id: i32,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<bool, ApiError> {
        let entry = AclEntry::new(user_id, resource_type, resource_id);
        self.store.acl_exists(scope, &entry).await
    }

    /// Fail with `AccessDenied` unless an entry exists.
    #[instrument(skip_all, fields(user_id = user_id, resource_type = %resource_type, resource_id = resource_id))]
    pub async fn check_access(
        &self,
        scope: Option<&mut S::Tx>,
        user_id: i32,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<(), ApiError> {
        if self
            .has_access(scope, user_id, resource_type, resource_id)
            .await?
        {
            record_access_check("granted");
            Ok(())
        } else {
            tracing::debug!(target: "api.service.acl", "Access denied");
            record_access_check("denied");
            Err(ApiError::AccessDenied)
        }
    }

    /// Remove an entry.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there was no such entry
    #[instrument(skip_all, fields(user_id = user_id, resource_type = %resource_type, resource_id = resource_id))]
    pub async fn revoke_access(
        &self,
        scope: Option<&mut S::Tx>,
        user_id: i32,
        resource_type: ResourceType,
        resource_id: i32,
    ) -> Result<(), ApiError> {
        let entry = AclEntry::new(user_id, resource_type, resource_id);
        if !self.store.delete_acl(scope, &entry).await? {
            return Err(ApiError::NotFound("Access entry not found".to_string()));
        }

        tracing::debug!(target: "api.service.acl", "Access revoked");
        Ok(())
    }
}
