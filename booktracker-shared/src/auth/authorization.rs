/// Authorization helpers
///
/// Ownership is the only resource-level rule: a user may act on what they
/// own, an administrator may act on anything. Handlers call these checks
/// after loading the resource.
///
/// # Example
///
/// ```
/// use booktracker_shared::auth::authorization::require_owner_or_admin;
/// use booktracker_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let auth = AuthContext { user_id: owner, is_admin: false };
/// assert!(require_owner_or_admin(&auth, owner).is_ok());
/// assert!(require_owner_or_admin(&auth, Uuid::new_v4()).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not an administrator
    #[error("Admin access required")]
    AdminRequired,

    /// Caller neither owns the resource nor is an administrator
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Requires the caller to be an administrator
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Whether the caller owns the resource or is an administrator
pub fn is_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> bool {
    auth.is_admin || auth.user_id == owner_id
}

/// Requires the caller to own the resource or be an administrator
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if is_owner_or_admin(auth, owner_id) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}
