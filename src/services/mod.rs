/// Resource Service Index
///
/// The two domain services sitting between the handlers and the repository.
/// User operations leave ownership checks to their callers; article
/// operations apply the access policy themselves because the decision
/// depends on the loaded row's state.
pub mod article;
pub mod user;

pub use article::ArticleService;
pub use user::UserService;
