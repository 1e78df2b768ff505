//! # todoctl: Users and Todos API
//!
//! `todoctl` is a small HTTP service that manages users and the todo items they
//! own. It exposes paginated, filterable and sortable listings, partial updates,
//! and deletes that take a user's todos with it.
//!
//! ## Architecture
//!
//! The crate is layered, each layer only talking to the one below it:
//!
//! - **[`api`]**: axum handlers plus request/response models and extractors that
//!   turn malformed input into 422s before any work is done
//! - **[`services`]**: business rules such as existence checks, conflict mapping
//!   and eager loading of todo owners
//! - **[`db`]**: repositories over a borrowed SQLite connection
//! - **[`auth`]**: the bearer token gate in front of every resource route
//! - **[`request_tracing`]**: correlation ids and per-request spans
//!
//! ## Request flow
//!
//! 1. The request is given an `x-request-id` (the client's, or a fresh UUID)
//!    and a tracing span carrying it.
//! 2. Resource routes pass through [`auth::middleware::require_bearer`].
//! 3. The handler opens a transaction, calls a service, and commits.
//! 4. Failures become [`errors::Error`], rendered as a status and `{"detail": ...}`.
//!
//! ## Getting started
//!
//! ```ignore
//! let config = Config::load(&args)?;
//! telemetry::init_telemetry(config.enable_otel_export, config.log_format)?;
//! Application::new(config).await?.serve(shutdown_signal()).await?;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod request_tracing;
pub mod services;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use bon::Builder;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::{Authenticator, StaticTokens, middleware::require_bearer};
use crate::config::{CorsConfig, CorsOrigin};
use crate::openapi::ApiDoc;

pub use config::Config;
pub use types::{TodoId, UserId};

/// Application state shared across all request handlers.
///
/// - `db`: SQLite connection pool; each request takes its own connection or transaction
/// - `config`: Application configuration loaded from file and environment
/// - `authenticator`: decides whether a bearer token grants access
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .authenticator(Arc::new(StaticTokens::new(["secret"])))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Create CORS layer from configuration, or `None` when no origins are configured.
fn create_cors_layer(config: &CorsConfig) -> anyhow::Result<Option<CorsLayer>> {
    if config.allowed_origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::with_capacity(config.allowed_origins.len());
        for origin in &config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Url serializes with a trailing slash; browsers send the bare origin.
                let origin = url.as_str().trim_end_matches('/');
                origins.push(
                    origin
                        .parse::<HeaderValue>()
                        .with_context(|| format!("invalid CORS origin {origin}"))?,
                );
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(request_tracing::REQUEST_ID_HEADER)])
        .allow_credentials(config.allow_credentials);

    if let Some(max_age) = config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(Some(cors))
}

/// Build the application router with all endpoints and middleware.
///
/// Users and todos routes answer with and without a trailing slash and sit
/// behind the bearer token gate. `/`, `/health` and the API reference at
/// `/docs` are public.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{health, todos, users};

    let resource_routes = Router::new()
        // User management
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        // Todo management
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/with-users", get(todos::list_todos_with_users))
        .route("/todos/with-users/", get(todos::list_todos_with_users))
        .route(
            "/todos/{id}",
            get(todos::get_todo).patch(todos::update_todo).delete(todos::delete_todo),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    let router = Router::new()
        .route("/", get(health::status))
        .route("/health", get(health::health))
        .merge(resource_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(RequestBodyLimitLayer::new(state.config.limits.max_body_size));

    let router = match create_cors_layer(&state.config.cors)? {
        Some(cors) => router.layer(cors),
        None => router,
    };

    Ok(request_tracing::with_request_tracing(router))
}

/// The assembled service: pool, schema and router, ready to serve.
///
/// 1. **Create**: [`Application::new`] opens the pool and ensures the schema exists
/// 2. **Serve**: [`Application::serve`] binds to the configured address and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish,
///    then the pool is closed and telemetry flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application over an existing pool (or open one from config when `None`)
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!("Starting todoctl with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => db::connect(&config.database)
                .await
                .with_context(|| format!("failed to open database {}", config.database.url))?,
        };

        db::schema::ensure_schema(&pool).await.context("failed to create schema")?;

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .authenticator(Arc::new(StaticTokens::new(config.auth.tokens.iter().cloned())) as Arc<dyn Authenticator>)
            .build();

        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;
        info!("todoctl listening on http://{}", bind_addr);

        // Run the server with graceful shutdown
        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
