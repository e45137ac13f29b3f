use crate::{
    domain::{LedgerEntry, PointsDelta, PointsTotals, ProfileRecord, UserId},
    ports::{
        database::{self, PointsStore},
        directory::{self, UserDirectory},
    },
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// In-process users table and points ledger
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, String>,
    /// Entries in insertion order
    ledger: Vec<LedgerEntry>,
}

impl Tables {
    fn profile(&self, user_id: UserId) -> Option<ProfileRecord> {
        let user_email = self.users.get(&user_id)?.clone();
        let latest = self
            .ledger
            .iter()
            .rev()
            .find(|entry| entry.user_id == user_id);

        Some(ProfileRecord {
            user_email,
            points: latest.map(|entry| entry.points),
            points_balance: latest.map(|entry| entry.points_balance),
            order_id: latest.and_then(|entry| entry.order_id),
        })
    }

    fn find_user(&self, user_email: &str) -> Option<UserId> {
        self.users
            .iter()
            .find(|(_, email)| email.as_str() == user_email)
            .map(|(user_id, _)| *user_id)
    }
}

impl MemoryDatabase {
    pub fn with_user(self, user_id: UserId, user_email: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .insert(user_id, user_email.into());
        self
    }

    /// Record a complete ledger entry, including fields the points API never writes
    pub fn record(&self, entry: LedgerEntry) -> Result<(), database::Error> {
        self.inner.lock()?.ledger.push(entry);
        Ok(())
    }

    /// Every entry recorded for the user, oldest first
    pub fn entries(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, database::Error> {
        Ok(self
            .inner
            .lock()?
            .ledger
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl PointsStore for MemoryDatabase {
    async fn profile_by_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<ProfileRecord>, database::Error> {
        Ok(self.inner.lock()?.profile(user_id))
    }

    async fn profile_by_email(
        &self,
        user_email: &str,
    ) -> Result<Option<ProfileRecord>, database::Error> {
        let tables = self.inner.lock()?;
        Ok(tables
            .find_user(user_email)
            .and_then(|user_id| tables.profile(user_id)))
    }

    async fn totals(&self, user_id: UserId) -> Result<PointsTotals, database::Error> {
        self.inner
            .lock()?
            .ledger
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .try_fold(PointsTotals::default(), |totals, entry| {
                totals.apply(PointsDelta {
                    points: entry.points,
                    points_balance: entry.points_balance,
                })
            })
            .ok_or(database::Error::TotalsOutOfRange(user_id))
    }

    async fn append(&self, user_id: UserId, delta: PointsDelta) -> Result<(), database::Error> {
        self.record(LedgerEntry::new(user_id, delta))
    }

    async fn ping(&self) -> Result<(), database::Error> {
        drop(self.inner.lock()?);
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryDatabase {
    async fn lookup_by_email(
        &self,
        user_email: &str,
    ) -> Result<Option<UserId>, directory::Error> {
        Ok(self.inner.lock()?.find_user(user_email))
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for database::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

impl<T> From<PoisonError<T>> for directory::Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
