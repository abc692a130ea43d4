/// Bookmark endpoints
///
/// Bookmarks always belong to the caller: listing shows only the caller's
/// own marks, and deleting someone else's id looks exactly like deleting a
/// missing one.
///
/// # Endpoints
///
/// - `POST /api/books/:id/bookmarks` - `{ "page": 12, "note": "..." }`
/// - `GET /api/books/:id/bookmarks` - Caller's bookmarks in the book, newest first
/// - `DELETE /api/books/bookmarks/:bookmark_id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidatedJson},
    routes::books::find_shared_book,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use booktracker_shared::{
    auth::middleware::AuthContext,
    models::bookmark::{Bookmark, CreateBookmark},
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookmarkRequest {
    #[validate(range(min = 1, message = "Page must be a positive number"))]
    pub page: i32,

    #[validate(length(max = 2000, message = "Note must be at most 2000 characters"))]
    pub note: Option<String>,
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(book_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateBookmarkRequest>,
) -> ApiResult<(StatusCode, Json<Bookmark>)> {
    find_shared_book(&state, &auth, book_id).await?;

    let bookmark = state
        .store
        .create_bookmark(CreateBookmark {
            user_id: auth.user_id,
            book_id,
            page: req.page,
            note: req.note.filter(|n| !n.trim().is_empty()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(bookmark)))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Bookmark>>> {
    let bookmarks = state.store.list_bookmarks(auth.user_id, book_id).await?;
    Ok(Json(bookmarks))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(bookmark_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.store.delete_bookmark(bookmark_id, auth.user_id).await? {
        return Err(ApiError::NotFound("Bookmark not found".to_string()));
    }

    Ok(Json(json!({ "message": "Bookmark deleted" })))
}
