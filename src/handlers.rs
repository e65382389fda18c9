use crate::{
    AppState,
    auth::{AuthUser, MaybeUser},
    error::ApiError,
    models::{
        ApiResponse, Article, ArticleFilterQuery, CreateArticleRequest, LoginRequest,
        LoginResponse, PageQuery, Paged, RegisterRequest, UpdateArticleRequest, UpdateUserRequest,
        UserResponse,
    },
    policy::{self, Actor},
};
use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

/// ApiQuery
///
/// Query-string extractor reporting deserialization failures (bad booleans,
/// non-numeric page values) through the standard failure envelope instead of
/// axum's plain-text rejection.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a new identity. Always role USER; a supplied role
/// field is ignored by the service.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    payload.validate()?;

    let user = state.users.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user, "User created successfully")),
    ))
}

/// login
///
/// [Public Route] Verifies credentials and returns the identity plus a
/// 7-day bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    payload.validate()?;

    let auth = state.users.login(payload).await?;

    Ok(Json(ApiResponse::with_message(auth, "Login successful")))
}

// --- User Handlers ---

/// list_users
///
/// [Admin Route] Paged listing of all identities, newest first.
#[utoipa::path(
    get,
    path = "/api/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users page", body = Paged<UserResponse>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ApiResponse<Paged<UserResponse>>>, ApiError> {
    let actor = Actor::from(auth_user);
    policy::require_admin(&actor)?;

    let page = state
        .users
        .list(query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;

    Ok(Json(ApiResponse::success(page)))
}

/// get_user
///
/// [Authenticated Route] Self-or-admin access to a single identity.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 403, description = "Not self or admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let actor = Actor::from(auth_user);
    policy::can_access_user(&actor, id)?;

    let user = state.users.get(id).await?.ok_or(ApiError::UserNotFound)?;

    Ok(Json(ApiResponse::success(user)))
}

/// update_user
///
/// [Authenticated Route] Partial update, self-or-admin.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 403, description = "Not self or admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    payload.validate()?;

    let actor = Actor::from(auth_user);
    policy::can_access_user(&actor, id)?;

    let user = state.users.update(id, payload).await?;

    Ok(Json(ApiResponse::with_message(
        user,
        "User updated successfully",
    )))
}

/// delete_user
///
/// [Admin Route] Removes an identity; their articles cascade with them.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = Actor::from(auth_user);
    policy::require_admin(&actor)?;

    state.users.delete(id).await?;

    Ok(Json(ApiResponse::message_only("User deleted successfully")))
}

// --- Article Handlers ---

/// create_article
///
/// [Authenticated Route] Submits a new article. The author is always the
/// actor resolved from the token.
#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = Article),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn create_article(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Article>>), ApiError> {
    payload.validate()?;

    let article = state.articles.create(payload, author_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            article,
            "Article created successfully",
        )),
    ))
}

/// list_articles
///
/// [Optional-Auth Route] Filtered, paginated listing. Anonymous callers only
/// ever see public articles, no matter which filters they send.
#[utoipa::path(
    get,
    path = "/api/articles",
    params(ArticleFilterQuery),
    responses((status = 200, description = "Articles page", body = Paged<Article>))
)]
pub async fn list_articles(
    MaybeUser(auth_user): MaybeUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ArticleFilterQuery>,
) -> Result<Json<ApiResponse<Paged<Article>>>, ApiError> {
    let actor = Actor::from(auth_user);

    let page = state.articles.list(filter, &actor).await?;

    Ok(Json(ApiResponse::success(page)))
}

/// get_article
///
/// [Optional-Auth Route] Single article by id. Private articles require an
/// authenticated actor.
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 403, description = "Private article, anonymous caller"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_article(
    MaybeUser(auth_user): MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Article>>, ApiError> {
    let actor = Actor::from(auth_user);

    let article = state.articles.get(id, &actor).await?;

    Ok(Json(ApiResponse::success(article)))
}

/// update_article
///
/// [Authenticated Route] Partial update, author-or-admin.
#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 403, description = "Not author or admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateArticleRequest>,
) -> Result<Json<ApiResponse<Article>>, ApiError> {
    payload.validate()?;

    let actor = Actor::from(auth_user);

    let article = state.articles.update(id, payload, &actor).await?;

    Ok(Json(ApiResponse::with_message(
        article,
        "Article updated successfully",
    )))
}

/// delete_article
///
/// [Authenticated Route] Deletes an article, author-or-admin.
#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Not author or admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = Actor::from(auth_user);

    state.articles.delete(id, &actor).await?;

    Ok(Json(ApiResponse::message_only(
        "Article deleted successfully",
    )))
}

// --- Health ---

/// health
///
/// [Public Route] Liveness probe for monitoring and load balancers.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": format!("{:?}", state.config.env),
    }))
}
