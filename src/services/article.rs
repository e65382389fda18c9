use crate::{
    error::ApiError,
    models::{Article, ArticleFilterQuery, CreateArticleRequest, Paged, UpdateArticleRequest},
    policy::{self, Actor},
    repository::{ArticleQuery, RepositoryState},
};
use uuid::Uuid;

/// ArticleService
///
/// CRUD over articles. Unlike the user service, policy checks happen inside
/// these methods: read and write decisions depend on the loaded article's
/// visibility and authorship, which only exist after the fetch.
#[derive(Clone)]
pub struct ArticleService {
    repo: RepositoryState,
}

impl ArticleService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// The author is always the authenticated actor; there is no
    /// client-settable author field to override it.
    pub async fn create(
        &self,
        req: CreateArticleRequest,
        author_id: Uuid,
    ) -> Result<Article, ApiError> {
        Ok(self.repo.create_article(req, author_id).await?)
    }

    /// get
    ///
    /// Not-found is reported before the policy runs, so a denied reader can
    /// still distinguish "no such article" (404) from "private" (403).
    pub async fn get(&self, id: Uuid, actor: &Actor) -> Result<Article, ApiError> {
        let article = self
            .repo
            .get_article(id)
            .await?
            .ok_or(ApiError::ArticleNotFound)?;

        policy::can_read_article(actor, &article)?;

        Ok(article)
    }

    /// list
    ///
    /// Filtered, paginated listing. The requested visibility filter passes
    /// through the policy first: anonymous actors can never see private rows
    /// regardless of what they asked for.
    pub async fn list(
        &self,
        filter: ArticleFilterQuery,
        actor: &Actor,
    ) -> Result<Paged<Article>, ApiError> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter.limit.unwrap_or(10).max(1);

        let query = ArticleQuery {
            visibility: policy::list_visibility(actor, filter.is_public),
            tag: filter.tags,
            author_id: filter.author_id,
            search: filter.search,
            page,
            limit,
        };

        let (items, total) = self.repo.list_articles(query).await?;

        Ok(Paged {
            items,
            total,
            page,
            limit,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateArticleRequest,
        actor: &Actor,
    ) -> Result<Article, ApiError> {
        let existing = self
            .repo
            .get_article(id)
            .await?
            .ok_or(ApiError::ArticleNotFound)?;

        policy::can_modify_article(actor, &existing)?;

        self.repo
            .update_article(id, patch)
            .await?
            // Deleted between the fetch and the write.
            .ok_or(ApiError::ArticleNotFound)
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<(), ApiError> {
        let existing = self
            .repo
            .get_article(id)
            .await?
            .ok_or(ApiError::ArticleNotFound)?;

        policy::can_modify_article(actor, &existing)?;

        if self.repo.delete_article(id).await? {
            Ok(())
        } else {
            Err(ApiError::ArticleNotFound)
        }
    }
}
