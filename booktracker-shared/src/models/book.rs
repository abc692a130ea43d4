/// Book model and database operations
///
/// A book is uploaded document metadata plus the path of the stored file.
/// The owner never changes after creation; the download counter only grows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE books (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     author VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     file_path VARCHAR(1024) NOT NULL,
///     file_type VARCHAR(16) NOT NULL,
///     owned_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     is_approved BOOLEAN NOT NULL DEFAULT FALSE,
///     downloads BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const COLUMNS: &str =
    "id, title, author, description, file_path, file_type, owned_by, is_approved, downloads, created_at";

/// Book metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,

    pub title: String,

    pub author: String,

    pub description: String,

    /// Path of the stored file, relative to the working directory or absolute
    pub file_path: String,

    /// Lowercase extension of the uploaded file, without the dot
    pub file_type: String,

    /// Owning user (immutable)
    pub owned_by: Uuid,

    /// Moderation state: approved books are visible to every user
    pub is_approved: bool,

    /// Number of completed download requests
    pub downloads: i64,

    pub created_at: DateTime<Utc>,
}

/// Book joined with its owner's username, for admin listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookWithOwner {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub book: Book,

    /// None when the owner row is gone
    pub owner_username: Option<String>,
}

/// Input for creating a book record
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub file_path: String,
    pub file_type: String,
    pub owned_by: Uuid,
    pub is_approved: bool,
}

/// Metadata edit; only non-None fields are written
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
}

impl Book {
    /// Inserts a new book record
    pub async fn create(pool: &PgPool, data: CreateBook) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO books (title, author, description, file_path, file_type, owned_by, is_approved) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .bind(data.file_path)
            .bind(data.file_type)
            .bind(data.owned_by)
            .bind(data.is_approved)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1");

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's books, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE owned_by = $1 ORDER BY created_at DESC");

        sqlx::query_as::<_, Book>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Lists every book record, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books ORDER BY created_at DESC");

        sqlx::query_as::<_, Book>(&query).fetch_all(pool).await
    }

    /// Lists books with owner usernames, optionally only unapproved ones
    pub async fn list_with_owner(
        pool: &PgPool,
        pending_only: bool,
    ) -> Result<Vec<BookWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, BookWithOwner>(
            r#"
            SELECT b.id, b.title, b.author, b.description, b.file_path, b.file_type,
                   b.owned_by, b.is_approved, b.downloads, b.created_at,
                   u.username AS owner_username
            FROM books b
            LEFT JOIN users u ON u.id = b.owned_by
            WHERE ($1 = FALSE OR b.is_approved = FALSE)
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(pending_only)
        .fetch_all(pool)
        .await
    }

    /// Marks a book approved
    pub async fn approve(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("UPDATE books SET is_approved = TRUE WHERE id = $1 RETURNING {COLUMNS}");

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Updates title/author/description
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateBook,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE books SET title = COALESCE($2, title), author = COALESCE($3, author), \
             description = COALESCE($4, description) WHERE id = $1 RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.author)
            .bind(data.description)
            .fetch_optional(pool)
            .await
    }

    /// Atomically increments the download counter
    pub async fn increment_downloads(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE books SET downloads = downloads + 1 WHERE id = $1 RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a record, returning it if it existed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("DELETE FROM books WHERE id = $1 RETURNING {COLUMNS}");

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Deletes every book owned by a user, returning the removed records
    pub async fn delete_by_owner<'e, E>(executor: E, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("DELETE FROM books WHERE owned_by = $1 RETURNING {COLUMNS}");

        sqlx::query_as::<_, Book>(&query)
            .bind(owner_id)
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_owner_flattens() {
        let book = Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: String::new(),
            file_path: "uploads/1.epub".to_string(),
            file_type: "epub".to_string(),
            owned_by: Uuid::new_v4(),
            is_approved: true,
            downloads: 3,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(BookWithOwner {
            book,
            owner_username: Some("paul".to_string()),
        })
        .unwrap();

        assert_eq!(json["title"], "Dune");
        assert_eq!(json["ownerUsername"], "paul");
        assert_eq!(json["isApproved"], true);
        assert_eq!(json["downloads"], 3);
        assert!(json["ownedBy"].is_string());
    }
}
