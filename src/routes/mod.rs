/// Router Module Index
///
/// Routing is segregated by access level, so each policy is applied
/// explicitly at the module level rather than per-handler by convention.

/// Routes open to any client: registration, login, health, and the
/// optional-auth article reads (where anonymous access is legitimate and
/// visibility is enforced by the access policy).
pub mod public;

/// Routes behind the authentication layer: article writes and user
/// self-service. Owner/admin authorization happens in the handlers via the
/// policy module.
pub mod authenticated;

/// Admin-only routes. Handlers authenticate via the AuthUser extractor and
/// then require the ADMIN role.
pub mod admin;
