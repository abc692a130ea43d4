/// Bookmark model and database operations
///
/// Every query is scoped by the owning user; a bookmark id alone never
/// reaches a row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bookmarks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     book_id UUID NOT NULL,
///     page INTEGER NOT NULL CHECK (page > 0),
///     note TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, user_id, book_id, page, note, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub page: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBookmark {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub page: i32,
    pub note: Option<String>,
}

impl Bookmark {
    pub async fn create(pool: &PgPool, data: CreateBookmark) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookmarks (user_id, book_id, page, note) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Bookmark>(&query)
            .bind(data.user_id)
            .bind(data.book_id)
            .bind(data.page)
            .bind(data.note)
            .fetch_one(pool)
            .await
    }

    /// Lists one user's bookmarks in one book, newest first
    pub async fn list_for_user_and_book(
        pool: &PgPool,
        user_id: Uuid,
        book_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookmarks WHERE user_id = $1 AND book_id = $2 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Bookmark>(&query)
            .bind(user_id)
            .bind(book_id)
            .fetch_all(pool)
            .await
    }

    /// Deletes a bookmark only if it belongs to `user_id`
    pub async fn delete_for_user(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
