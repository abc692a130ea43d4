/// In-memory store for tests and local development
///
/// Records live in insertion-ordered vectors behind one mutex, so every
/// operation (the cascade delete included) is atomic with respect to the
/// others. Email comparison is case-insensitive, matching the CITEXT column.
///
/// # Example
///
/// ```
/// use booktracker_shared::store::{MemoryStore, UserStore};
/// use booktracker_shared::models::user::CreateUser;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.create_user(CreateUser {
///     username: "reader".to_string(),
///     email: "Reader@Example.com".to_string(),
///     password_hash: "hash".to_string(),
///     is_admin: false,
/// }).await?;
///
/// assert!(store.find_user_by_email("reader@example.com").await?.is_some());
/// # Ok(())
/// # }
/// ```

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{BookStore, BookmarkStore, Store, StoreError, StoreResult, UserStore};
use crate::models::book::{Book, BookWithOwner, CreateBook, UpdateBook};
use crate::models::bookmark::{Bookmark, CreateBookmark};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    books: Vec<Book>,
    bookmarks: Vec<Bookmark>,
}

impl State {
    /// Rejects an email/username held by a user other than `except`
    fn check_unique(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        except: Option<Uuid>,
    ) -> StoreResult<()> {
        for user in self.users.iter().filter(|u| Some(u.id) != except) {
            if email.is_some_and(|e| user.email.eq_ignore_ascii_case(e)) {
                return Err(StoreError::Conflict("Email is already registered".to_string()));
            }
            if username.is_some_and(|n| user.username == n) {
                return Err(StoreError::Conflict("Username is already taken".to_string()));
            }
        }
        Ok(())
    }

    fn book_mut(&mut self, id: Uuid) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.id == id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state();
        state.check_unique(Some(&data.email), Some(&data.username), None)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            is_admin: data.is_admin,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) || u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.state().users.clone())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut state = self.state();
        if !state.users.iter().any(|u| u.id == id) {
            return Ok(None);
        }
        state.check_unique(data.email.as_deref(), data.username.as_deref(), Some(id))?;

        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = data.username {
            user.username = username;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_admin) = data.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user_cascade(&self, id: Uuid) -> StoreResult<Option<Vec<Book>>> {
        let mut state = self.state();
        let Some(pos) = state.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        state.users.remove(pos);

        let (removed, kept): (Vec<Book>, Vec<Book>) =
            std::mem::take(&mut state.books).into_iter().partition(|b| b.owned_by == id);
        state.books = kept;
        state.bookmarks.retain(|b| b.user_id != id);

        Ok(Some(removed))
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn create_book(&self, data: CreateBook) -> StoreResult<Book> {
        let book = Book {
            id: Uuid::new_v4(),
            title: data.title,
            author: data.author,
            description: data.description,
            file_path: data.file_path,
            file_type: data.file_type,
            owned_by: data.owned_by,
            is_approved: data.is_approved,
            downloads: 0,
            created_at: Utc::now(),
        };
        self.state().books.push(book.clone());
        Ok(book)
    }

    async fn find_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        Ok(self.state().books.iter().find(|b| b.id == id).cloned())
    }

    async fn list_books_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Book>> {
        Ok(self
            .state()
            .books
            .iter()
            .rev()
            .filter(|b| b.owned_by == owner_id)
            .cloned()
            .collect())
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(self.state().books.iter().rev().cloned().collect())
    }

    async fn list_books_with_owner(&self, pending_only: bool) -> StoreResult<Vec<BookWithOwner>> {
        let state = self.state();
        Ok(state
            .books
            .iter()
            .rev()
            .filter(|b| !pending_only || !b.is_approved)
            .map(|b| BookWithOwner {
                book: b.clone(),
                owner_username: state
                    .users
                    .iter()
                    .find(|u| u.id == b.owned_by)
                    .map(|u| u.username.clone()),
            })
            .collect())
    }

    async fn approve_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        let mut state = self.state();
        Ok(state.book_mut(id).map(|book| {
            book.is_approved = true;
            book.clone()
        }))
    }

    async fn update_book(&self, id: Uuid, data: UpdateBook) -> StoreResult<Option<Book>> {
        let mut state = self.state();
        Ok(state.book_mut(id).map(|book| {
            if let Some(title) = data.title {
                book.title = title;
            }
            if let Some(author) = data.author {
                book.author = author;
            }
            if let Some(description) = data.description {
                book.description = description;
            }
            book.clone()
        }))
    }

    async fn increment_downloads(&self, id: Uuid) -> StoreResult<Option<Book>> {
        let mut state = self.state();
        Ok(state.book_mut(id).map(|book| {
            book.downloads += 1;
            book.clone()
        }))
    }

    async fn delete_book(&self, id: Uuid) -> StoreResult<Option<Book>> {
        let mut state = self.state();
        let pos = state.books.iter().position(|b| b.id == id);
        Ok(pos.map(|pos| state.books.remove(pos)))
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn create_bookmark(&self, data: CreateBookmark) -> StoreResult<Bookmark> {
        let bookmark = Bookmark {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            book_id: data.book_id,
            page: data.page,
            note: data.note,
            created_at: Utc::now(),
        };
        self.state().bookmarks.push(bookmark.clone());
        Ok(bookmark)
    }

    async fn list_bookmarks(&self, user_id: Uuid, book_id: Uuid) -> StoreResult<Vec<Bookmark>> {
        Ok(self
            .state()
            .bookmarks
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id && b.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn delete_bookmark(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.bookmarks.len();
        state.bookmarks.retain(|b| !(b.id == id && b.user_id == user_id));
        Ok(state.bookmarks.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
