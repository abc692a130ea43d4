/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and the caller's profile
/// - `books`: Listing, reading, editing, deleting and downloading books
/// - `upload`: Multipart book upload
/// - `bookmarks`: Per-user page bookmarks
/// - `admin`: User management and moderation

pub mod admin;
pub mod auth;
pub mod bookmarks;
pub mod books;
pub mod health;
pub mod upload;
