/// Book endpoints
///
/// # Endpoints
///
/// - `GET /api/books` and `GET /api/books/my-books` - Caller's books, newest first
/// - `GET /api/books/:id` - One book (owner or admin)
/// - `PUT /api/books/:id` - Edit title/author/description (admin)
/// - `DELETE /api/books/:id` - Delete record and file (owner or admin)
/// - `GET /api/books/download/:id` - Stream the file as an attachment
///
/// Downloads are also open to any user once a book is approved; an
/// unapproved book the caller may not read is reported as not found.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidatedJson},
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use booktracker_shared::{
    auth::{
        authorization::{is_owner_or_admin, require_admin, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::book::{Book, UpdateBook},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use validator::Validate;

/// Metadata edit
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: Option<String>,

    pub description: Option<String>,
}

pub(crate) async fn find_book(state: &AppState, id: Uuid) -> ApiResult<Book> {
    state
        .store
        .find_book(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))
}

/// Loads a book the caller may download or bookmark
///
/// Owners and admins see every book, everyone else only approved ones.
pub(crate) async fn find_shared_book(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Book> {
    let book = find_book(state, id).await?;

    if book.is_approved || is_owner_or_admin(auth, book.owned_by) {
        Ok(book)
    } else {
        Err(ApiError::NotFound("Book not found".to_string()))
    }
}

/// Removes a deleted book's file, logging instead of failing
pub(crate) async fn remove_book_file(state: &AppState, book: &Book) {
    if let Err(e) = state.files.remove(&book.file_path).await {
        tracing::warn!(
            book_id = %book.id,
            path = %book.file_path,
            error = %e,
            "Book deleted but its file could not be removed"
        );
    }
}

pub async fn list_my_books(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Book>>> {
    let books = state.store.list_books_by_owner(auth.user_id).await?;
    Ok(Json(books))
}

pub async fn get_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Book>> {
    let book = find_book(&state, id).await?;
    require_owner_or_admin(&auth, book.owned_by)?;

    Ok(Json(book))
}

/// Admin-only metadata edit
///
/// The owner and the download counter are never touched.
pub async fn update_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateBookRequest>,
) -> ApiResult<Json<Book>> {
    require_admin(&auth)?;

    let book = state
        .store
        .update_book(
            id,
            UpdateBook {
                title: req.title,
                author: req.author,
                description: req.description,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let book = find_book(&state, id).await?;
    require_owner_or_admin(&auth, book.owned_by)?;

    let deleted = state
        .store
        .delete_book(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    remove_book_file(&state, &deleted).await;

    tracing::info!(book_id = %id, user_id = %auth.user_id, "Book deleted");
    Ok(Json(json!({ "message": "Book deleted" })))
}

/// Streams the stored file and counts the download
///
/// The counter is incremented only once the file has been opened.
pub async fn download_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let book = find_shared_book(&state, &auth, id).await?;

    let file = state.files.open(&book.file_path).await?;

    state
        .store
        .increment_downloads(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, content_type(&book.file_type).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}.{}\"",
                attachment_stem(&book.title),
                book.file_type
            ),
        ),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

fn content_type(file_type: &str) -> &'static str {
    match file_type {
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// ASCII-only download name derived from the title
fn attachment_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = stem.trim().trim_matches('.');
    if stem.is_empty() {
        "book".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_stem() {
        assert_eq!(attachment_stem("Dune"), "Dune");
        assert_eq!(attachment_stem("War & Peace"), "War _ Peace");
        assert_eq!(attachment_stem("\"quoted\"\r\n"), "_quoted___");
        assert_eq!(attachment_stem("..."), "book");
        assert_eq!(attachment_stem("Café"), "Caf_");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("pdf"), "application/pdf");
        assert_eq!(content_type("epub"), "application/epub+zip");
        assert_eq!(content_type("bin"), "application/octet-stream");
    }
}
