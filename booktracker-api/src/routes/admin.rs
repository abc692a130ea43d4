/// Administrator endpoints
///
/// Every route here sits behind the bearer token check and the
/// `require_admin` guard, so handlers never look at the admin flag.
///
/// # Endpoints
///
/// - `GET /api/admin/users` / `POST /api/admin/users`
/// - `PUT /api/admin/users/:id` / `DELETE /api/admin/users/:id` (cascades to books)
/// - `GET /api/admin/pending-books`, `GET /api/admin/all-books`
/// - `PUT /api/admin/approve-book/:id`
/// - `DELETE /api/admin/books/:id`
/// - `DELETE /api/admin/cleanup-orphaned`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidatedJson},
    routes::{
        auth::hash_new_password,
        books::{find_book, remove_book_file},
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use booktracker_shared::{
    auth::password,
    models::{
        book::{Book, BookWithOwner},
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[serde(default)]
    pub is_admin: bool,
}

/// Partial account edit; a blank password keeps the current one
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: Option<String>,

    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub deleted: u64,
    pub message: String,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            is_admin: req.is_admin,
        })
        .await?;

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User created by admin");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let update = UpdateUser {
        username: req.username,
        email: req.email,
        password_hash: hash_new_password(req.password.as_deref())?,
        is_admin: req.is_admin,
    };

    let user = state
        .store
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Deletes a user and every book they own, files included
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let books = state
        .store
        .delete_user_cascade(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    for book in &books {
        remove_book_file(&state, book).await;
    }

    tracing::info!(user_id = %id, books = books.len(), "User deleted");
    Ok(Json(json!({ "message": "User and their books deleted" })))
}

pub async fn pending_books(State(state): State<AppState>) -> ApiResult<Json<Vec<BookWithOwner>>> {
    Ok(Json(state.store.list_books_with_owner(true).await?))
}

pub async fn all_books(State(state): State<AppState>) -> ApiResult<Json<Vec<BookWithOwner>>> {
    Ok(Json(state.store.list_books_with_owner(false).await?))
}

pub async fn approve_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Book>> {
    let book = state
        .store
        .approve_book(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    tracing::info!(book_id = %id, "Book approved");
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    find_book(&state, id).await?;

    if let Some(book) = state.store.delete_book(id).await? {
        remove_book_file(&state, &book).await;
    }

    Ok(Json(json!({ "message": "Book deleted" })))
}

/// Drops every book record whose file is missing from disk
pub async fn cleanup_orphaned(State(state): State<AppState>) -> ApiResult<Json<CleanupResponse>> {
    let deleted = state.store.cleanup_orphaned(&state.files).await?;

    Ok(Json(CleanupResponse {
        deleted,
        message: format!("Deleted {deleted} orphaned book records."),
    }))
}
