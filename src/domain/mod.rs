use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identifier of a user in the external directory
///
/// Identifiers are issued by the directory and are never zero. A zero identifier is treated the
/// same as an absent one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Point and balance deltas carried by a single accumulate request
///
/// Either value may be zero or negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointsDelta {
    pub points: i64,
    pub points_balance: i64,
}

/// Sum of every ledger entry recorded for a user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointsTotals {
    pub points: i64,
    pub points_balance: i64,
}

impl PointsTotals {
    /// Totals after applying `delta`
    ///
    /// Returns `None` if either figure would overflow.
    pub fn apply(self, delta: PointsDelta) -> Option<Self> {
        Some(Self {
            points: self.points.checked_add(delta.points)?,
            points_balance: self.points_balance.checked_add(delta.points_balance)?,
        })
    }
}

/// A user joined with at most one of their ledger entries
///
/// The points fields are `None` when the user has no ledger entry at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileRecord {
    pub user_email: String,
    pub points: Option<i64>,
    pub points_balance: Option<i64>,
    pub order_id: Option<i64>,
}

/// One append-only row of the points ledger
#[derive(Clone, Debug)]
pub struct LedgerEntry {
    pub user_id: UserId,
    pub points: i64,
    pub points_balance: i64,
    /// Order that earned or spent the points, if any
    pub order_id: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(user_id: UserId, delta: PointsDelta) -> Self {
        Self {
            user_id,
            points: delta.points,
            points_balance: delta.points_balance,
            order_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_order(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// How the points reader locates a profile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileLookup<'a> {
    ById(UserId),
    ByEmail(&'a str),
}

impl<'a> ProfileLookup<'a> {
    /// An identifier always wins over an email. Returns `None` if neither is present.
    pub fn select(user_id: Option<UserId>, user_email: Option<&'a str>) -> Option<Self> {
        match (user_id, user_email) {
            (Some(user_id), _) => Some(Self::ById(user_id)),
            (None, Some(user_email)) => Some(Self::ByEmail(user_email)),
            (None, None) => None,
        }
    }
}
