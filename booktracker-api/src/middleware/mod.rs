/// Middleware modules for the API server
///
/// Authentication lives in `booktracker_shared::auth::middleware`; this
/// module holds the response hardening applied to every route.

pub mod security;
