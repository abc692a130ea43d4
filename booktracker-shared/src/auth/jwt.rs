/// Bearer token issuance and verification
///
/// Tokens are JWTs signed with HS256 and carry the user's identity together
/// with their admin flag, so authorization checks never need a store lookup.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validity**: fixed 24 hours from issuance
/// - **Validation**: signature, expiration (no leeway), not-before and issuer
///
/// # Example
///
/// ```
/// use booktracker_shared::auth::jwt::{issue_token, verify_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "your-secret-key-at-least-32-bytes";
///
/// let token = issue_token(user_id, false, secret)?;
/// let claims = verify_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// assert!(!claims.is_admin);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer embedded in every token
pub const ISSUER: &str = "booktracker";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or structure did not check out
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Token claims
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "booktracker")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `is_admin`: Admin flag at the time of issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "booktracker"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Whether the user was an administrator when the token was issued
    pub is_admin: bool,
}

impl Claims {
    /// Validity window of every token
    pub fn lifetime() -> Duration {
        Duration::hours(24)
    }

    /// Creates claims issued now
    pub fn new(user_id: Uuid, is_admin: bool) -> Self {
        Self::issued_at(user_id, is_admin, Utc::now())
    }

    /// Creates claims as if issued at `issued_at`
    ///
    /// Expiry is always `issued_at + 24h`.
    ///
    /// ```
    /// use booktracker_shared::auth::jwt::Claims;
    /// use chrono::{Duration, Utc};
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::issued_at(Uuid::new_v4(), false, Utc::now() - Duration::hours(25));
    /// assert!(claims.is_expired());
    /// ```
    pub fn issued_at(user_id: Uuid, is_admin: bool, issued_at: DateTime<Utc>) -> Self {
        let expiration = issued_at + Self::lifetime();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            nbf: issued_at.timestamp(),
            is_admin,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Signs claims into a token string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a 24-hour token for a user
pub fn issue_token(user_id: Uuid, is_admin: bool, secret: &str) -> Result<String, JwtError> {
    create_token(&Claims::new(user_id, is_admin), secret)
}

/// Verifies a token and extracts its claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired (zero leeway)
/// - Issuer is "booktracker"
/// - Token is not used before its nbf time
///
/// # Errors
///
/// - `JwtError::Expired` once the expiry has passed
/// - `JwtError::InvalidIssuer` for tokens minted by someone else
/// - `JwtError::ValidationError` for malformed tokens or bad signatures
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: ISSUER.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_lifetime_is_24_hours() {
        assert_eq!(Claims::lifetime(), Duration::hours(24));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, true);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "booktracker");
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_and_verify() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, false, SECRET).expect("Should issue token");

        let claims = verify_token(&token, SECRET).expect("Should verify token");
        assert_eq!(claims.sub, user_id);
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_admin_flag_survives_roundtrip() {
        let token = issue_token(Uuid::new_v4(), true, SECRET).unwrap();
        assert!(verify_token(&token, SECRET).unwrap().is_admin);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issue_token(Uuid::new_v4(), false, "secret1").unwrap();

        let result = verify_token(&token, "wrong-secret");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_verify_malformed_token() {
        assert!(verify_token("not-a-token", SECRET).is_err());
        assert!(verify_token("", SECRET).is_err());
        assert!(verify_token("a.b.c", SECRET).is_err());
    }

    #[test]
    fn test_accepted_just_before_expiry() {
        // Issued 23h59m ago: one minute of validity left
        let issued = Utc::now() - Duration::hours(23) - Duration::minutes(59);
        let claims = Claims::issued_at(Uuid::new_v4(), false, issued);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(verify_token(&token, SECRET).is_ok());
    }

    #[test]
    fn test_rejected_just_after_expiry() {
        // Issued 24h01m ago: expired one minute ago
        let issued = Utc::now() - Duration::hours(24) - Duration::minutes(1);
        let claims = Claims::issued_at(Uuid::new_v4(), false, issued);
        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), true);
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(
            verify_token(&token, SECRET),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }
}
