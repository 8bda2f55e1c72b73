//! User identity service.
//!
//! Creates and updates users, verifies login credentials and manages API
//! keys. Lookups come in two flavours: `get_safe_*` returns a [`SafeUser`]
//! with every secret stripped, `get_full_*` returns the stored [`User`] for
//! callers that need the hashes.

use crate::crypto;
use crate::errors::ApiError;
use crate::models::{NewUser, SafeUser, User, UserChanges, UserUpdate};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_api_key_rotation;
use crate::repositories::CredentialStore;
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::instrument;

pub struct UserService<S: CredentialStore> {
    store: Arc<S>,
    bcrypt_cost: u32,
}

impl<S: CredentialStore> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}

impl<S: CredentialStore> UserService<S> {
    pub fn new(store: Arc<S>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Register a new user. The password is stored only as a bcrypt hash.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation` if the username is taken
    #[instrument(skip_all, fields(username_hash = %hash_for_correlation(&new_user.username)))]
    pub async fn create(&self, new_user: NewUser) -> Result<SafeUser, ApiError> {
        let password_hash =
            crypto::hash_secret(new_user.password.expose_secret(), self.bcrypt_cost)?;

        let user = self
            .store
            .insert_user(&new_user.username, &password_hash)
            .await?;

        tracing::info!(target: "api.service.user", user_id = user.id, "User created");
        Ok(SafeUser::from(user))
    }

    pub async fn get_safe_by_id(&self, id: i32) -> Result<SafeUser, ApiError> {
        self.get_full_by_id(id).await.map(SafeUser::from)
    }

    pub async fn get_full_by_id(&self, id: i32) -> Result<User, ApiError> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    pub async fn get_safe_by_username(&self, username: &str) -> Result<SafeUser, ApiError> {
        self.get_full_by_username(username).await.map(SafeUser::from)
    }

    pub async fn get_full_by_username(&self, username: &str) -> Result<User, ApiError> {
        self.store
            .find_user_by_username(username)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    /// Apply profile changes. A new password is hashed before it is stored.
    #[instrument(skip_all, fields(user_id = id))]
    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<SafeUser, ApiError> {
        let password_hash = match &changes.password {
            Some(password) => Some(crypto::hash_secret(
                password.expose_secret(),
                self.bcrypt_cost,
            )?),
            None => None,
        };

        let update = UserUpdate {
            username: changes.username,
            password_hash,
        };

        let user = self
            .store
            .update_user(id, &update)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        tracing::debug!(target: "api.service.user", "User updated");
        Ok(SafeUser::from(user))
    }

    /// Issue a fresh API key, replacing any previous one.
    ///
    /// Only the bcrypt hash is stored. The returned plaintext is the single
    /// copy and must go straight back to the caller.
    #[instrument(skip_all, fields(user_id = id))]
    pub async fn update_api_key(&self, id: i32) -> Result<SecretString, ApiError> {
        let result = self.rotate_api_key(id).await;
        record_api_key_rotation(if result.is_ok() { "success" } else { "error" });
        result
    }

    async fn rotate_api_key(&self, id: i32) -> Result<SecretString, ApiError> {
        let api_key = crypto::generate_api_key()?;
        let api_key_hash = crypto::hash_secret(api_key.expose_secret(), self.bcrypt_cost)?;

        if !self.store.set_api_key_hash(id, &api_key_hash).await? {
            return Err(ApiError::UserNotFound);
        }

        tracing::info!(target: "api.service.user", "API key rotated");
        Ok(api_key)
    }

    /// Verify a username/password pair.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no user has this username
    /// - `UserCredentialsNotValid` if the password does not match
    #[instrument(skip_all, fields(username_hash = %hash_for_correlation(username)))]
    pub async fn get_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SafeUser, ApiError> {
        let user = match self.store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                crypto::equalize_timing(password);
                tracing::debug!(target: "api.service.user", "Login for unknown user");
                return Err(ApiError::UserNotFound);
            }
        };

        if !crypto::verify_secret(password, &user.password)? {
            tracing::debug!(target: "api.service.user", user_id = user.id, "Password mismatch");
            return Err(ApiError::UserCredentialsNotValid);
        }

        Ok(SafeUser::from(user))
    }

    /// Check a composite `<userId>:<apiKey>` key.
    ///
    /// Returns `Ok(false)` only for a well-formed key of a known user whose
    /// stored key does not match.
    ///
    /// # Errors
    ///
    /// - `UserApiTokenNotValid` if the key has no colon or the id is not a number
    /// - `UserNotFound` if the user does not exist
    /// - `AccessDenied` if the user has never been issued an API key
    #[instrument(skip_all)]
    pub async fn is_api_composite_key_valid(&self, composite_key: &str) -> Result<bool, ApiError> {
        self.check_composite_key(composite_key)
            .await
            .map(|(_, valid)| valid)
    }

    /// Like [`is_api_composite_key_valid`](Self::is_api_composite_key_valid),
    /// but a mismatch is an error and success yields the user id.
    #[instrument(skip_all)]
    pub async fn validate_composite_api_key(&self, composite_key: &str) -> Result<i32, ApiError> {
        match self.check_composite_key(composite_key).await? {
            (user_id, true) => Ok(user_id),
            (user_id, false) => {
                tracing::debug!(target: "api.service.user", user_id, "API key mismatch");
                Err(ApiError::UserApiTokenNotValid)
            }
        }
    }

    async fn check_composite_key(&self, composite_key: &str) -> Result<(i32, bool), ApiError> {
        let (user_id, api_key) = parse_composite_key(composite_key)?;

        let user = self.get_full_by_id(user_id).await?;
        let Some(api_key_hash) = user.api_key.as_deref() else {
            return Err(ApiError::AccessDenied);
        };

        let valid = crypto::verify_secret(api_key, api_key_hash)?;
        Ok((user_id, valid))
    }
}

/// Split `<userId>:<apiKey>` on the first colon.
fn parse_composite_key(composite_key: &str) -> Result<(i32, &str), ApiError> {
    let (id, api_key) = composite_key
        .split_once(':')
        .ok_or(ApiError::UserApiTokenNotValid)?;

    let user_id = id
        .parse::<i32>()
        .map_err(|_| ApiError::UserApiTokenNotValid)?;

    Ok((user_id, api_key))
}
