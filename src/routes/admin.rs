use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get},
};

/// Admin Router Module
///
/// Routes restricted to the ADMIN role. These handlers authenticate through
/// the AuthUser extractor and then apply `policy::require_admin`, so no
/// separate middleware layer is needed here.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/users?page=&limit=
        // Paged listing of every identity in the system.
        .route("/api/users", get(handlers::list_users))
        // DELETE /api/users/{id}
        // Removes an identity; owned articles cascade in the database.
        .route("/api/users/{id}", delete(handlers::delete_user))
}
