/// Book upload endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/books/upload
/// Content-Type: multipart/form-data
///
/// title, author, description: text fields
/// book (or book-file): the document, .pdf/.doc/.docx/.epub
/// ```
///
/// The extension is checked from the client filename before any bytes are
/// written. The file is stored first and the record second; if the record
/// cannot be created the stored file is removed again.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use booktracker_shared::{
    auth::middleware::AuthContext,
    files::FileStore,
    models::book::{Book, CreateBook},
};

/// Multipart field names accepted for the document
const FILE_FIELDS: [&str; 2] = ["book", "book-file"];

/// Matches the VARCHAR(255) title and author columns
const MAX_TEXT_CHARS: usize = 255;

#[derive(Debug, Default)]
struct UploadForm {
    title: Option<String>,
    author: Option<String>,
    description: Option<String>,
    /// Validated extension and file bytes
    file: Option<(String, bytes::Bytes)>,
}

impl UploadForm {
    fn required(value: Option<String>, field: &str) -> Result<String, ValidationErrorDetail> {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ValidationErrorDetail::new(field, format!("{field} is required")))?;

        if value.chars().count() > MAX_TEXT_CHARS {
            return Err(ValidationErrorDetail::new(
                field,
                format!("{field} must be at most {MAX_TEXT_CHARS} characters"),
            ));
        }

        Ok(value)
    }
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            let original = field.file_name().unwrap_or_default().to_string();
            let ext = FileStore::validate_extension(&original)?;
            let data = field.bytes().await?;
            form.file = Some((ext, data));
            continue;
        }

        match name.as_str() {
            "title" => form.title = Some(field.text().await?),
            "author" => form.author = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            _ => tracing::debug!(field = %name, "Ignoring unknown upload field"),
        }
    }

    Ok(form)
}

/// Upload a new book
///
/// # Errors
///
/// - `400 Bad Request`: no file, a disallowed file type, or missing title/author
/// - `413 Payload Too Large`: body over `UPLOAD_MAX_BYTES`
/// - `500 Internal Server Error`: the file could not be stored
pub async fn upload_book(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let form = read_form(multipart).await?;

    let (ext, data) = form.file.ok_or_else(|| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("book", "No file uploaded")])
    })?;

    let mut errors = Vec::new();
    let title = UploadForm::required(form.title, "title").map_err(|e| errors.push(e)).ok();
    let author = UploadForm::required(form.author, "author").map_err(|e| errors.push(e)).ok();
    let (Some(title), Some(author)) = (title, author) else {
        return Err(ApiError::ValidationError(errors));
    };

    let stored = state.files.store(&ext, &data).await?;

    let is_approved = auth.is_admin || !state.config.uploads.require_approval;

    let created = state
        .store
        .create_book(CreateBook {
            title,
            author,
            description: form.description.unwrap_or_default().trim().to_string(),
            file_path: stored.path.clone(),
            file_type: stored.file_type,
            owned_by: auth.user_id,
            is_approved,
        })
        .await;

    let book = match created {
        Ok(book) => book,
        Err(e) => {
            if let Err(remove_err) = state.files.remove(&stored.path).await {
                tracing::error!(path = %stored.path, error = %remove_err, "Failed to remove file after rejected upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        book_id = %book.id,
        user_id = %auth.user_id,
        size = data.len(),
        approved = book.is_approved,
        "Book uploaded"
    );

    Ok((StatusCode::CREATED, Json(book)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(UploadForm::required(Some("  Dune ".to_string()), "title").unwrap(), "Dune");
        assert!(UploadForm::required(Some("   ".to_string()), "title").is_err());
        assert!(UploadForm::required(None, "author").is_err());
    }

    #[test]
    fn test_required_enforces_column_length() {
        let longest = "é".repeat(MAX_TEXT_CHARS);
        assert_eq!(UploadForm::required(Some(longest.clone()), "title").unwrap(), longest);

        let err = UploadForm::required(Some("x".repeat(MAX_TEXT_CHARS + 1)), "title").unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.message, "title must be at most 255 characters");
    }
}
