/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user, returns a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `GET /api/auth/me` - Caller's account
/// - `PUT /api/auth/me` - Edit caller's username, email or password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use booktracker_shared::{
    auth::{
        jwt,
        middleware::AuthContext,
        password::{self, PasswordError},
    },
    models::user::{CreateUser, UpdateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token response for register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token, valid for 24 hours
    pub token: String,
}

/// Self-service profile edit; the admin flag is not editable here
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Blank or absent keeps the current password
    pub password: Option<String>,
}

/// Hashes a replacement password, ignoring blank input
pub(crate) fn hash_new_password(password: Option<&str>) -> Result<Option<String>, PasswordError> {
    match password.map(str::trim).filter(|p| !p.is_empty()) {
        Some(_) => password.map(password::hash_password).transpose(),
        None => Ok(None),
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "username": "reader", "email": "reader@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or the email/username is taken
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    if state
        .store
        .find_user_by_email_or_username(&req.email, &req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            is_admin: false,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = jwt::issue_token(user.id, user.is_admin, state.jwt_secret())?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Login endpoint
///
/// Unknown emails and wrong passwords fail identically, and both paths run
/// a full hash verification.
///
/// # Errors
///
/// - `400 Bad Request`: `invalid_credentials`
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state.store.find_user_by_email(&req.email).await?;

    let valid = password::verify_password_or_dummy(
        &req.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
    )?;

    let user = match user {
        Some(user) if valid => user,
        _ => return Err(ApiError::InvalidCredentials),
    };

    let token = jwt::issue_token(user.id, user.is_admin, state.jwt_secret())?;

    Ok(Json(TokenResponse { token }))
}

/// Returns the authenticated user's account
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Updates the authenticated user's profile
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let update = UpdateUser {
        username: req.username,
        email: req.email,
        password_hash: hash_new_password(req.password.as_deref())?,
        is_admin: None,
    };

    let user = state
        .store
        .update_user(auth.user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_password_not_hashed() {
        assert_eq!(hash_new_password(None).unwrap(), None);
        assert_eq!(hash_new_password(Some("")).unwrap(), None);
        assert_eq!(hash_new_password(Some("   ")).unwrap(), None);

        let hash = hash_new_password(Some("new-password")).unwrap().unwrap();
        assert!(password::verify_password("new-password", &hash).unwrap());
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            username: String::new(),
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("password"));
    }
}
