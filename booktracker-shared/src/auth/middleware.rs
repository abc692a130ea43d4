/// Authentication middleware for Axum
///
/// Protected routes carry `Authorization: Bearer <token>`. [`authenticate`]
/// verifies the token with the signing secret, and the server's layer stores
/// the resulting [`AuthContext`] in the request extensions. [`require_admin`]
/// is layered inside it on admin-only routers.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, response::Response, routing::get, Extension, Router};
/// use booktracker_shared::auth::middleware::{authenticate, require_admin, AuthContext, AuthError};
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// async fn bearer(mut req: Request, next: Next) -> Result<Response, AuthError> {
///     let auth = authenticate(req.headers(), "secret")?;
///     req.extensions_mut().insert(auth);
///     Ok(next.run(req).await)
/// }
///
/// let app: Router = Router::new()
///     .route("/admin/stats", get(protected_handler))
///     .layer(middleware::from_fn(require_admin))
///     .layer(middleware::from_fn(bearer));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{verify_token, JwtError};

/// Identity attached to an authenticated request
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Admin flag carried by the token
    pub is_admin: bool,
}

impl AuthContext {
    /// Creates auth context from verified token claims
    pub fn from_claims(claims: &super::jwt::Claims) -> Self {
        Self {
            user_id: claims.sub,
            is_admin: claims.is_admin,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Authorization header is not a bearer token
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),

    /// Authenticated, but the route needs an administrator
    #[error("Admin access required")]
    AdminRequired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthError::AdminRequired => (StatusCode::FORBIDDEN, "forbidden"),
            _ => (StatusCode::UNAUTHORIZED, "unauthorized"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Extracts and verifies the bearer token from request headers
///
/// # Errors
///
/// - `MissingCredentials` when there is no usable `Authorization` header
/// - `InvalidFormat` when the scheme is not `Bearer`
/// - `InvalidToken` when verification fails or the token has expired
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = verify_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext::from_claims(&claims))
}

/// Admin capability guard
///
/// Must run after the bearer token middleware. Responds 403 when the caller
/// is not an administrator, and 401 when no identity was attached at all.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(AuthError::MissingCredentials)?;

    if !auth.is_admin {
        tracing::debug!(user_id = %auth.user_id, "Rejected non-admin request");
        return Err(AuthError::AdminRequired);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, issue_token, Claims};
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    const SECRET: &str = "middleware-test-secret-32-bytes-long";

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, true, SECRET).unwrap();

        let auth = authenticate(&bearer(&token), SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert!(auth.is_admin);
    }

    #[test]
    fn test_authenticate_missing_header() {
        let result = authenticate(&HeaderMap::new(), SECRET);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_authenticate_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

        let result = authenticate(&headers, SECRET);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_authenticate_expired_token() {
        let claims = Claims::issued_at(Uuid::new_v4(), false, Utc::now() - Duration::hours(25));
        let token = create_token(&claims, SECRET).unwrap();

        let result = authenticate(&bearer(&token), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(msg)) if msg == "Token expired"));
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("x".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AdminRequired.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
