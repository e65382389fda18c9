use crate::models::{Article, CreateArticleRequest, UpdateArticleRequest, UpdateUserRequest, User};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// NewUser
///
/// Insertion parameters for a user row. Built by the user service after
/// hashing the raw password; the raw password never reaches this layer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub role: crate::models::Role,
    pub password_hash: String,
}

/// ArticleQuery
///
/// Fully resolved listing parameters. `visibility` has already been through
/// the access policy: for anonymous actors it arrives as `Some(true)`.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub visibility: Option<bool>,
    pub tag: Option<String>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

/// Repository
///
/// The abstract contract for all persistence operations. Handlers and
/// services depend on this trait rather than a concrete client, so tests can
/// substitute an in-memory implementation.
///
/// No authorization happens here: ownership and visibility decisions are the
/// policy module's job, made before (or on the rows returned by) these calls.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    // Page is 1-based; ordered by creation time descending.
    async fn list_users(&self, page: i64, limit: i64) -> Result<(Vec<User>, i64), sqlx::Error>;
    // Partial update; returns None when the row does not exist.
    async fn update_user(
        &self,
        id: Uuid,
        patch: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error>;
    // Returns false when the row does not exist.
    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Articles ---
    async fn create_article(
        &self,
        article: CreateArticleRequest,
        author_id: Uuid,
    ) -> Result<Article, sqlx::Error>;
    async fn get_article(&self, id: Uuid) -> Result<Option<Article>, sqlx::Error>;
    // Returns the page of rows plus the total count under the same filters.
    async fn list_articles(&self, query: ArticleQuery) -> Result<(Vec<Article>, i64), sqlx::Error>;
    async fn update_article(
        &self,
        id: Uuid,
        patch: UpdateArticleRequest,
    ) -> Result<Option<Article>, sqlx::Error>;
    async fn delete_article(&self, id: Uuid) -> Result<bool, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of [`Repository`], backed by a sqlx
/// connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row offset for a 1-based page. Saturating: extreme client-supplied page
/// or limit values land on an empty page instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(limit)
}

const USER_COLUMNS: &str = "id, email, display_name, role, password_hash, created_at, updated_at";
const ARTICLE_COLUMNS: &str = "id, title, content, tags, is_public, author_id, created_at, updated_at";

/// Append the WHERE fragments shared by the listing row query and its count
/// query. All values go through bind parameters.
fn push_article_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ArticleQuery) {
    if let Some(is_public) = query.visibility {
        builder.push(" AND is_public = ");
        builder.push_bind(is_public);
    }

    if let Some(tag) = &query.tag {
        builder.push(" AND ");
        builder.push_bind(tag.clone());
        builder.push(" = ANY(tags)");
    }

    if let Some(author_id) = query.author_id {
        builder.push(" AND author_id = ");
        builder.push_bind(author_id);
    }

    if let Some(search) = &query.search {
        // Case-insensitive substring match over title OR content.
        let pattern = format!("%{}%", search);
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR content ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (id, email, display_name, role, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.email)
            .bind(user.display_name)
            .bind(user.role)
            .bind(user.password_hash)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_users(&self, page: i64, limit: i64) -> Result<(Vec<User>, i64), sqlx::Error> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(page_offset(page, limit))
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    async fn update_user(
        &self,
        id: Uuid,
        patch: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "UPDATE users \
             SET email = COALESCE($2, email), \
                 display_name = COALESCE($3, display_name), \
                 role = COALESCE($4, role), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(patch.email)
            .bind(patch.display_name)
            .bind(patch.role)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_article(
        &self,
        article: CreateArticleRequest,
        author_id: Uuid,
    ) -> Result<Article, sqlx::Error> {
        let sql = format!(
            "INSERT INTO articles (id, title, content, tags, is_public, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             RETURNING {ARTICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Article>(&sql)
            .bind(Uuid::new_v4())
            .bind(article.title)
            .bind(article.content)
            .bind(article.tags)
            .bind(article.is_public)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>, sqlx::Error> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_articles(
        &self,
        query: ArticleQuery,
    ) -> Result<(Vec<Article>, i64), sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE TRUE"
        ));
        push_article_filters(&mut builder, &query);
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(page_offset(query.page, query.limit));

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM articles WHERE TRUE");
        push_article_filters(&mut count_builder, &query);

        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((articles, total))
    }

    async fn update_article(
        &self,
        id: Uuid,
        patch: UpdateArticleRequest,
    ) -> Result<Option<Article>, sqlx::Error> {
        let sql = format!(
            "UPDATE articles \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 tags = COALESCE($4, tags), \
                 is_public = COALESCE($5, is_public), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ARTICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.content)
            .bind(patch.tags)
            .bind(patch.is_public)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
