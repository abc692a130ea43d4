/// Startup administrator provisioning
///
/// When `ADMIN_EMAIL` and `ADMIN_PASSWORD` are configured, the server makes
/// sure that account exists as an administrator before serving requests. An
/// existing user with that email is promoted and given the configured
/// password; otherwise a new admin is created.

use crate::config::AdminConfig;
use booktracker_shared::{
    auth::password::{hash_password, PasswordError},
    models::user::{CreateUser, UpdateUser, User},
    store::{Store, StoreError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to hash admin password: {0}")]
    Password(#[from] PasswordError),

    #[error("Failed to provision admin user: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOutcome {
    Created,
    Promoted,
}

pub async fn ensure_admin(
    store: &dyn Store,
    admin: &AdminConfig,
) -> Result<(User, AdminOutcome), BootstrapError> {
    let password_hash = hash_password(&admin.password)?;

    if let Some(existing) = store.find_user_by_email(&admin.email).await? {
        let update = UpdateUser {
            password_hash: Some(password_hash),
            is_admin: Some(true),
            ..Default::default()
        };

        let user = store
            .update_user(existing.id, update)
            .await?
            .ok_or(StoreError::NotFound)?;

        tracing::info!(user_id = %user.id, email = %user.email, "Existing user promoted to admin");
        return Ok((user, AdminOutcome::Promoted));
    }

    let user = store
        .create_user(CreateUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            is_admin: true,
        })
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin user created");
    Ok((user, AdminOutcome::Created))
}
