/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use booktracker_api::{app::AppState, config::Config};
/// use booktracker_shared::{db::pool::{create_pool, DatabaseConfig}, files::FileStore, store::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(&config.database.url)).await?;
/// let files = FileStore::new(&config.uploads.dir).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), files, config);
/// let app = booktracker_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use booktracker_shared::{
    auth::middleware::{authenticate, require_admin},
    files::FileStore,
    store::Store,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// User, book and bookmark persistence
    pub store: Arc<dyn Store>,

    /// Upload directory
    pub files: FileStore,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, files: FileStore, config: Config) -> Self {
        Self {
            store,
            files,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                       # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register            # public
///     │   ├── POST /login               # public
///     │   └── GET|PUT /me
///     ├── /books/                       # authenticated
///     │   ├── GET    /                  # caller's books
///     │   ├── GET    /my-books
///     │   ├── POST   /upload            # multipart
///     │   ├── GET    /download/:id
///     │   ├── GET|PUT|DELETE /:id       # PUT is admin only
///     │   ├── POST|GET /:id/bookmarks
///     │   └── DELETE /bookmarks/:bookmark_id
///     └── /admin/                       # authenticated + admin
///         ├── GET|POST /users
///         ├── PUT|DELETE /users/:id
///         ├── GET    /pending-books
///         ├── PUT    /approve-book/:id
///         ├── GET    /all-books
///         ├── DELETE /books/:id
///         └── DELETE /cleanup-orphaned
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Bearer token authentication, then the admin guard (per router)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth = from_fn_with_state(state.clone(), jwt_auth_layer);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me).put(routes::auth::update_me))
        .route_layer(auth.clone())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let book_routes = Router::new()
        .route("/", get(routes::books::list_my_books))
        .route("/my-books", get(routes::books::list_my_books))
        .route(
            "/upload",
            post(routes::upload::upload_book)
                .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes)),
        )
        .route("/download/:id", get(routes::books::download_book))
        .route(
            "/:id",
            get(routes::books::get_book)
                .put(routes::books::update_book)
                .delete(routes::books::delete_book),
        )
        .route(
            "/:id/bookmarks",
            post(routes::bookmarks::create_bookmark).get(routes::bookmarks::list_bookmarks),
        )
        .route(
            "/bookmarks/:bookmark_id",
            delete(routes::bookmarks::delete_bookmark),
        )
        .route_layer(auth.clone());

    // Admin guard runs inside the token check
    let admin_routes = Router::new()
        .route(
            "/users",
            get(routes::admin::list_users).post(routes::admin::create_user),
        )
        .route(
            "/users/:id",
            put(routes::admin::update_user).delete(routes::admin::delete_user),
        )
        .route("/pending-books", get(routes::admin::pending_books))
        .route("/approve-book/:id", put(routes::admin::approve_book))
        .route("/all-books", get(routes::admin::all_books))
        .route("/books/:id", delete(routes::admin::delete_book))
        .route("/cleanup-orphaned", delete(routes::admin::cleanup_orphaned))
        .route_layer(from_fn(require_admin))
        .route_layer(auth);

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/books", book_routes)
        .nest("/admin", admin_routes);

    let cors = cors_layer(&state.config);
    let production = state.config.api.production();

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Permissive when the origin list contains `*`, otherwise an allow-list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer token middleware layer
///
/// Verifies the token against the configured secret, then injects
/// the caller's `AuthContext` into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
