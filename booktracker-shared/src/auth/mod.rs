/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: 24-hour bearer token issuance and verification
/// - [`middleware`]: Axum middleware attaching [`middleware::AuthContext`] and the admin guard
/// - [`authorization`]: Owner-or-admin capability checks
///
/// # Example
///
/// ```no_run
/// use booktracker_shared::auth::password::{hash_password, verify_password};
/// use booktracker_shared::auth::jwt::{issue_token, verify_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = issue_token(Uuid::new_v4(), false, "secret-key")?;
/// let claims = verify_token(&token, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
