/// Database models for BookTracker
///
/// Each model carries its PostgreSQL CRUD operations as associated
/// functions; [`crate::store::PgStore`] wires them behind the store traits.
///
/// # Models
///
/// - `user`: Accounts, credentials and the admin flag
/// - `book`: Uploaded document metadata
/// - `bookmark`: Per-user page annotations
///
/// # Example
///
/// ```no_run
/// use booktracker_shared::models::book::Book;
/// use booktracker_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let books = Book::list_by_owner(&pool, Uuid::new_v4()).await?;
/// # Ok(())
/// # }
/// ```

pub mod book;
pub mod bookmark;
pub mod user;
