use crate::domain::{PointsDelta, PointsTotals, ProfileRecord, UserId};

/// Storage for the points ledger
///
/// The ledger is append-only: current figures are always derived from the recorded entries.
#[mockall::automock]
#[async_trait::async_trait]
pub trait PointsStore: Send + Sync {
    /// Profile joined with the user's most recent ledger entry, looked up by identifier
    async fn profile_by_id(&self, user_id: UserId) -> Result<Option<ProfileRecord>, Error>;

    /// Profile joined with the user's most recent ledger entry, looked up by email
    async fn profile_by_email(&self, user_email: &str) -> Result<Option<ProfileRecord>, Error>;

    /// Sum of every ledger entry for the user
    ///
    /// A user without entries has zero totals.
    async fn totals(&self, user_id: UserId) -> Result<PointsTotals, Error>;

    /// Record a new ledger entry with the raw deltas
    async fn append(&self, user_id: UserId, delta: PointsDelta) -> Result<(), Error>;

    /// Check that the store can serve queries
    async fn ping(&self) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sum of a user's ledger entries does not fit in an `i64`
    #[error("points total for user {0} is out of range")]
    TotalsOutOfRange(UserId),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
