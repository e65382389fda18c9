use crate::{
    auth,
    config::AppConfig,
    error::ApiError,
    models::{
        LoginRequest, LoginResponse, Paged, RegisterRequest, Role, UpdateUserRequest, UserResponse,
    },
    password,
    repository::{NewUser, RepositoryState},
};
use uuid::Uuid;

/// UserService
///
/// CRUD over user identities plus the two credential flows (register, login).
/// `update` and `delete` perform no authorization internally; handlers must
/// apply the access policy before calling them.
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
    config: AppConfig,
}

impl UserService {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }

    /// register
    ///
    /// Creates a new identity with role USER. Any role supplied by the client
    /// is ignored here; only `update` can change a role. Duplicate emails are
    /// rejected before the insert (the unique constraint backstops races).
    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, ApiError> {
        if self.repo.get_user_by_email(&req.email).await?.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let password_hash = password::hash_password(&req.password)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let user = self
            .repo
            .create_user(NewUser {
                email: req.email,
                display_name: req.display_name,
                role: Role::User,
                password_hash,
            })
            .await?;

        Ok(user.into())
    }

    /// login
    ///
    /// Verifies the credentials and issues a signed bearer token. Unknown
    /// email and wrong password produce the identical error so a caller
    /// cannot probe which of the two failed.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        let user = self
            .repo
            .get_user_by_email(&req.email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        let valid = password::verify_password(&req.password, &user.password_hash)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        let token = auth::issue_token(&self.config, &user)?;

        Ok(LoginResponse {
            user: user.into(),
            token,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<UserResponse>, ApiError> {
        Ok(self.repo.get_user(id).await?.map(UserResponse::from))
    }

    /// Paged listing ordered by creation time descending. Page and limit are
    /// clamped to at least 1.
    pub async fn list(&self, page: i64, limit: i64) -> Result<Paged<UserResponse>, ApiError> {
        let page = page.max(1);
        let limit = limit.max(1);

        let (users, total) = self.repo.list_users(page, limit).await?;

        Ok(Paged {
            items: users.into_iter().map(UserResponse::from).collect(),
            total,
            page,
            limit,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateUserRequest,
    ) -> Result<UserResponse, ApiError> {
        let user = self
            .repo
            .update_user(id, patch)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        Ok(user.into())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if self.repo.delete_user(id).await? {
            Ok(())
        } else {
            Err(ApiError::UserNotFound)
        }
    }
}
