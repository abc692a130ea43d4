/// Persistence seams for users, books and bookmarks
///
/// Handlers talk to a [`Store`] trait object so the API can run against
/// PostgreSQL in production and an in-memory backend in tests.
///
/// # Backends
///
/// - [`PgStore`]: PostgreSQL via the model functions in [`crate::models`]
/// - [`MemoryStore`]: Mutex-guarded maps, no persistence
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use booktracker_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// store.ping().await?;
/// let users = store.list_users().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::files::FileStore;
use crate::models::book::{Book, BookWithOwner, CreateBook, UpdateBook};
use crate::models::bookmark::{Bookmark, CreateBookmark};
use crate::models::user::{CreateUser, UpdateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique username/email violated
    #[error("{0}")]
    Conflict(String),

    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Account records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the email or username is taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive email lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> StoreResult<Option<User>>;

    /// Oldest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Returns None for an unknown id; [`StoreError::Conflict`] on a taken
    /// username or email
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Deletes the user and every book they own in one unit
    ///
    /// Returns the removed books so their files can be cleaned up, or None
    /// if no such user exists.
    async fn delete_user_cascade(&self, id: Uuid) -> StoreResult<Option<Vec<Book>>>;
}

/// Book metadata records
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create_book(&self, data: CreateBook) -> StoreResult<Book>;

    async fn find_book(&self, id: Uuid) -> StoreResult<Option<Book>>;

    /// Newest first
    async fn list_books_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Book>>;

    /// Every record, newest first
    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    /// Newest first, with owner usernames; `pending_only` keeps unapproved
    /// books
    async fn list_books_with_owner(&self, pending_only: bool) -> StoreResult<Vec<BookWithOwner>>;

    async fn approve_book(&self, id: Uuid) -> StoreResult<Option<Book>>;

    async fn update_book(&self, id: Uuid, data: UpdateBook) -> StoreResult<Option<Book>>;

    /// Adds exactly one to the counter as a single atomic operation
    async fn increment_downloads(&self, id: Uuid) -> StoreResult<Option<Book>>;

    async fn delete_book(&self, id: Uuid) -> StoreResult<Option<Book>>;

    /// Deletes every record whose stored file no longer exists
    ///
    /// Returns how many records were removed.
    async fn cleanup_orphaned(&self, files: &FileStore) -> StoreResult<u64> {
        let mut deleted = 0;

        for book in self.list_books().await? {
            if files.exists(&book.file_path).await {
                continue;
            }

            if self.delete_book(book.id).await?.is_some() {
                warn!(book_id = %book.id, path = %book.file_path, "Removed orphaned book record");
                deleted += 1;
            }
        }

        info!(deleted, "Orphan cleanup finished");
        Ok(deleted)
    }
}

/// Per-user page annotations
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn create_bookmark(&self, data: CreateBookmark) -> StoreResult<Bookmark>;

    /// One user's bookmarks in one book, newest first
    async fn list_bookmarks(&self, user_id: Uuid, book_id: Uuid) -> StoreResult<Vec<Bookmark>>;

    /// False if no bookmark with that id belongs to `user_id`
    async fn delete_bookmark(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

/// Everything a request handler needs
#[async_trait]
pub trait Store: UserStore + BookStore + BookmarkStore {
    /// Backend liveness probe
    async fn ping(&self) -> StoreResult<()>;
}
