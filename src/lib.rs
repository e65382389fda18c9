use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod services;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use services::{ArticleService, UserService};

/// ApiDoc
///
/// Aggregates every annotated handler and schema into the OpenAPI document
/// served at `/api-docs/openapi.json` (browsable at `/swagger-ui`).
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login,
        handlers::list_users, handlers::get_user, handlers::update_user, handlers::delete_user,
        handlers::create_article, handlers::list_articles, handlers::get_article,
        handlers::update_article, handlers::delete_article,
    ),
    components(
        schemas(
            models::Role, models::UserResponse, models::Article,
            models::RegisterRequest, models::LoginRequest, models::LoginResponse,
            models::UpdateUserRequest, models::CreateArticleRequest, models::UpdateArticleRequest,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "article-portal", description = "User & Article REST API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container holding all application services and
/// configuration, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer behind the Repository trait.
    pub repo: RepositoryState,
    /// User resource service (registration, login, CRUD).
    pub users: UserService,
    /// Article resource service (CRUD + filtered listing).
    pub articles: ArticleService,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            users: UserService::new(repo.clone(), config.clone()),
            articles: ArticleService::new(repo.clone()),
            repo,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// The auth extractors pull the repository and config out of the shared state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated router: running the `AuthUser` extractor here
/// rejects token-less or invalid-token requests with the proper 401 envelope
/// before any handler executes. Handlers still receive their own `AuthUser`
/// for the identity itself.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware; optional auth lives in extractors.
        .merge(public::public_routes())
        // Authenticated routes: the token gate runs before the handlers.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: authentication plus the admin policy in-handler.
        .merge(admin::admin_routes())
        .with_state(state);

    // Observability and correlation layers, outermost first.
    base_router
        .layer(
            ServiceBuilder::new()
                // Generate a unique id for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Wrap the request/response lifecycle in a tracing span
                // carrying that id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Return the id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: includes the x-request-id header so every
/// log line for a single request is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
