use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. The two article reads take the
/// optional-auth extractor: a valid token upgrades the actor, anything else
/// resolves to anonymous, and the access policy decides what anonymous may
/// see.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancer checks.
        .route("/health", get(handlers::health))
        // POST /api/auth/register
        // New identity creation. Always role USER.
        .route("/api/auth/register", post(handlers::register))
        // POST /api/auth/login
        // Credential verification and token issuance.
        .route("/api/auth/login", post(handlers::login))
        // GET /api/articles?tags=&isPublic=&authorId=&search=&page=&limit=
        // Filtered listing. Anonymous callers are forced to public-only.
        .route("/api/articles", get(handlers::list_articles))
        // GET /api/articles/{id}
        // Single article; private articles require an authenticated actor.
        .route("/api/articles/{id}", get(handlers::get_article))
}
