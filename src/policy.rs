//! Access policy: pure ALLOW/DENY decisions, no I/O.
//!
//! Every authorization decision in the application flows through this module
//! so the branching lives in one place instead of being scattered across
//! handlers and services. Decisions are computed from the request's [`Actor`]
//! and freshly loaded resource state; nothing here is cached across requests.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Article, Role},
};

/// Actor
///
/// The identity making a request: either resolved from a valid bearer token
/// or anonymous. Request-scoped, never persisted.
#[derive(Debug, Clone)]
pub enum Actor {
    Authenticated { id: Uuid, email: String, role: Role },
    Anonymous,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Actor::Authenticated {
                role: Role::Admin,
                ..
            }
        )
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Actor::Authenticated { id, .. } => Some(*id),
            Actor::Anonymous => None,
        }
    }
}

impl From<AuthUser> for Actor {
    fn from(user: AuthUser) -> Self {
        Actor::Authenticated {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

impl From<Option<AuthUser>> for Actor {
    fn from(user: Option<AuthUser>) -> Self {
        match user {
            Some(user) => user.into(),
            None => Actor::Anonymous,
        }
    }
}

/// Deny
///
/// The reason a decision denied access; maps onto the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    AccessDenied,
    AdminRequired,
}

impl From<Deny> for ApiError {
    fn from(deny: Deny) -> Self {
        match deny {
            Deny::AccessDenied => ApiError::AccessDenied,
            Deny::AdminRequired => ApiError::AdminAccessRequired,
        }
    }
}

/// A computed decision: `Ok(())` is ALLOW, `Err(Deny)` carries the reason.
pub type Decision = Result<(), Deny>;

/// Reading an article: public articles are readable by anyone; private
/// articles require authentication.
///
/// Any authenticated actor may read a private article, not just its author.
/// This mirrors the upstream behavior and is deliberate; see DESIGN.md.
pub fn can_read_article(actor: &Actor, article: &Article) -> Decision {
    if article.is_public {
        return Ok(());
    }
    match actor {
        Actor::Authenticated { .. } => Ok(()),
        Actor::Anonymous => Err(Deny::AccessDenied),
    }
}

/// Updating or deleting an article: the author or an admin, regardless of
/// visibility.
pub fn can_modify_article(actor: &Actor, article: &Article) -> Decision {
    if actor.is_admin() || actor.id() == Some(article.author_id) {
        Ok(())
    } else {
        Err(Deny::AccessDenied)
    }
}

/// Reading or updating a user record: the user themselves or an admin.
pub fn can_access_user(actor: &Actor, target_user_id: Uuid) -> Decision {
    if actor.is_admin() || actor.id() == Some(target_user_id) {
        Ok(())
    } else {
        Err(Deny::AccessDenied)
    }
}

/// Listing all users and deleting users are admin-only operations.
pub fn require_admin(actor: &Actor) -> Decision {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Deny::AdminRequired)
    }
}

/// The effective visibility filter for article listings. Anonymous actors are
/// forced to public-only no matter what they asked for; authenticated actors
/// get their requested filter as-is (including "none", meaning both).
pub fn list_visibility(actor: &Actor, requested: Option<bool>) -> Option<bool> {
    match actor {
        Actor::Anonymous => Some(true),
        Actor::Authenticated { .. } => requested,
    }
}
