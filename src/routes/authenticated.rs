use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes requiring a valid bearer token. The auth middleware layered over
/// this router in `create_router` rejects unauthenticated requests before a
/// handler runs; the handlers then apply the owner/self/admin policy using
/// the resolved identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/articles
        // Submits a new article; the author is the authenticated actor.
        .route("/api/articles", post(handlers::create_article))
        // PUT/DELETE /api/articles/{id}
        // Author-or-admin modification, enforced by the access policy
        // against the loaded article's authorship.
        .route(
            "/api/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
        // GET/PUT /api/users/{id}
        // Self-or-admin access to a single identity.
        .route(
            "/api/users/{id}",
            get(handlers::get_user).put(handlers::update_user),
        )
}
