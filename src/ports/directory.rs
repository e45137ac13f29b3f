use crate::domain::UserId;

/// External directory that owns user accounts
#[mockall::automock]
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Identifier of the user with exactly this email, or `None` if nobody matches
    async fn lookup_by_email(&self, user_email: &str) -> Result<Option<UserId>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
