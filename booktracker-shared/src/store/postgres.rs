/// PostgreSQL-backed store
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{BookStore, BookmarkStore, Store, StoreError, StoreResult, UserStore};
use crate::db::pool::health_check;
use crate::models::book::{Book, BookWithOwner, CreateBook, UpdateBook};
use crate::models::bookmark::{Bookmark, CreateBookmark};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations on the users table to [`StoreError::Conflict`]
fn map_user_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.constraint() {
            Some("users_email_key") => {
                return StoreError::Conflict("Email is already registered".to_string())
            }
            Some("users_username_key") => {
                return StoreError::Conflict("Username is already taken".to_string())
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(map_user_error)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> StoreResult<Option<User>> {
        Ok(User::find_by_email_or_username(&self.pool, email, username).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        User::update(&self.pool, id, data).await.map_err(map_user_error)
    }

    async fn delete_user_cascade(&self, id: Uuid) -> StoreResult<Option<Vec<Book>>> {
        let mut tx = self.pool.begin().await?;

        let books = Book::delete_by_owner(&mut *tx, id).await?;
        if !User::delete(&mut *tx, id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;

        debug!(user_id = %id, books = books.len(), "Deleted user and owned books");
        Ok(Some(books))
    }
}

#[async_trait]
impl BookStore for PgStore {
    async fn create_book(&self, data: CreateBook) -> StoreResult<Book> {
        Ok(Book::create(&self.pool, data).await?)
    }

    async fn find_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(Book::find_by_id(&self.pool, id).await?)
    }

    async fn list_books_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Book>> {
        Ok(Book::list_by_owner(&self.pool, owner_id).await?)
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(Book::list(&self.pool).await?)
    }

    async fn list_books_with_owner(&self, pending_only: bool) -> StoreResult<Vec<BookWithOwner>> {
        Ok(Book::list_with_owner(&self.pool, pending_only).await?)
    }

    async fn approve_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(Book::approve(&self.pool, id).await?)
    }

    async fn update_book(&self, id: Uuid, data: UpdateBook) -> StoreResult<Option<Book>> {
        Ok(Book::update(&self.pool, id, data).await?)
    }

    async fn increment_downloads(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(Book::increment_downloads(&self.pool, id).await?)
    }

    async fn delete_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(Book::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl BookmarkStore for PgStore {
    async fn create_bookmark(&self, data: CreateBookmark) -> StoreResult<Bookmark> {
        Ok(Bookmark::create(&self.pool, data).await?)
    }

    async fn list_bookmarks(&self, user_id: Uuid, book_id: Uuid) -> StoreResult<Vec<Bookmark>> {
        Ok(Bookmark::list_for_user_and_book(&self.pool, user_id, book_id).await?)
    }

    async fn delete_bookmark(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Bookmark::delete_for_user(&self.pool, id, user_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
