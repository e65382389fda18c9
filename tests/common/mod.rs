#![allow(dead_code)]

use article_portal::{
    AppConfig, AppState, create_router,
    models::{
        Article, CreateArticleRequest, Role, UpdateArticleRequest, UpdateUserRequest, User,
    },
    password,
    repository::{ArticleQuery, NewUser, Repository, RepositoryState, page_offset},
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;

// --- In-Memory Repository ---

/// InMemoryRepository
///
/// A full in-memory implementation of the Repository trait so the HTTP
/// surface can be exercised end to end without Postgres. Mirrors the
/// production queries: creation-time-descending ordering, filter semantics,
/// pagination, and unique email.
#[derive(Default)]
pub struct InMemoryRepository {
    users: Mutex<Vec<User>>,
    articles: Mutex<Vec<Article>>,
}

impl InMemoryRepository {
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn article_count(&self) -> usize {
        self.articles.lock().unwrap().len()
    }

    /// Direct insert bypassing the HTTP surface, for seeding admins and
    /// fixtures. Hashes the password so the user can log in normally.
    pub fn seed_user(&self, email: &str, raw_password: &str, display_name: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            role,
            password_hash: password::hash_password(raw_password).expect("hash failed"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    /// Flip a stored user's role in place, simulating an out-of-band role
    /// change after a token was issued.
    pub fn set_role(&self, id: Uuid, role: Role) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.role = role;
        }
    }

    pub fn remove_user(&self, id: Uuid) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            display_name: new_user.display_name,
            role: new_user.role,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self, page: i64, limit: i64) -> Result<(Vec<User>, i64), sqlx::Error> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = users.len() as i64;
        let items = users
            .into_iter()
            .skip(page_offset(page, limit) as usize)
            .take(limit.try_into().unwrap_or(usize::MAX))
            .collect();
        Ok((items, total))
    }

    async fn update_user(
        &self,
        id: Uuid,
        patch: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(display_name) = patch.display_name {
            user.display_name = display_name;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() < before {
            // ON DELETE CASCADE.
            self.articles.lock().unwrap().retain(|a| a.author_id != id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn create_article(
        &self,
        req: CreateArticleRequest,
        author_id: Uuid,
    ) -> Result<Article, sqlx::Error> {
        let article = Article {
            id: Uuid::new_v4(),
            title: req.title,
            content: req.content,
            tags: req.tags,
            is_public: req.is_public,
            author_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.articles.lock().unwrap().push(article.clone());
        Ok(article)
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<Article>, sqlx::Error> {
        Ok(self
            .articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_articles(
        &self,
        query: ArticleQuery,
    ) -> Result<(Vec<Article>, i64), sqlx::Error> {
        let mut matches: Vec<Article> = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                if let Some(is_public) = query.visibility {
                    if a.is_public != is_public {
                        return false;
                    }
                }
                if let Some(tag) = &query.tag {
                    if !a.tags.contains(tag) {
                        return false;
                    }
                }
                if let Some(author_id) = query.author_id {
                    if a.author_id != author_id {
                        return false;
                    }
                }
                if let Some(search) = &query.search {
                    let needle = search.to_lowercase();
                    if !a.title.to_lowercase().contains(&needle)
                        && !a.content.to_lowercase().contains(&needle)
                    {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matches.len() as i64;
        let items = matches
            .into_iter()
            .skip(page_offset(query.page, query.limit) as usize)
            .take(query.limit.try_into().unwrap_or(usize::MAX))
            .collect();
        Ok((items, total))
    }

    async fn update_article(
        &self,
        id: Uuid,
        patch: UpdateArticleRequest,
    ) -> Result<Option<Article>, sqlx::Error> {
        let mut articles = self.articles.lock().unwrap();
        let Some(article) = articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            article.title = title;
        }
        if let Some(content) = patch.content {
            article.content = content;
        }
        if let Some(tags) = patch.tags {
            article.tags = tags;
        }
        if let Some(is_public) = patch.is_public {
            article.is_public = is_public;
        }
        article.updated_at = Utc::now();
        Ok(Some(article.clone()))
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != id);
        Ok(articles.len() < before)
    }
}

// --- Test App Harness ---

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
}

/// Spins the real router up on an ephemeral port, backed by the in-memory
/// repository.
pub async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::default());
    let repo_state: RepositoryState = repo.clone();
    let state = AppState::new(repo_state, AppConfig::default());
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

// --- HTTP Helpers ---

pub async fn register(
    client: &reqwest::Client,
    app: &TestApp,
    email: &str,
    password: &str,
    display_name: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
            "displayName": display_name,
        }))
        .send()
        .await
        .expect("register request failed")
}

/// Logs in and returns the bearer token.
pub async fn login_token(
    client: &reqwest::Client,
    app: &TestApp,
    email: &str,
    password: &str,
) -> String {
    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200, "login should succeed");

    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["token"]
        .as_str()
        .expect("token missing from login response")
        .to_string()
}

/// Creates an article via the API and returns the response body's data.
pub async fn create_article(
    client: &reqwest::Client,
    app: &TestApp,
    token: &str,
    title: &str,
    is_public: bool,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/articles", app.address))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "content": format!("Content of {title}"),
            "tags": ["general"],
            "isPublic": is_public,
        }))
        .send()
        .await
        .expect("create article request failed");
    assert_eq!(response.status(), 201, "article creation should succeed");

    let body: serde_json::Value = response.json().await.unwrap();
    body["data"].clone()
}
