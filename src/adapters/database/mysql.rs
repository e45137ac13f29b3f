use crate::{
    domain::{PointsDelta, PointsTotals, ProfileRecord, UserId},
    ports::{
        database::{self, PointsStore},
        directory::{self, UserDirectory},
    },
};
use chrono::Utc;
use sqlx::MySqlPool;

/// WordPress users table and WooCommerce points ledger in MySQL
///
/// Tables are named after the configured prefix: `{prefix}users` and
/// `{prefix}wc_points_rewards_user_points`.
#[derive(Clone, Debug)]
pub struct MySqlDatabase {
    pool: MySqlPool,
    queries: Queries,
}

impl MySqlDatabase {
    /// The prefix must already be validated: it is interpolated into the SQL text.
    pub fn new(pool: MySqlPool, table_prefix: &str) -> Self {
        Self {
            pool,
            queries: Queries::new(table_prefix),
        }
    }
}

/// SQL text, built once per adapter
#[derive(Clone, Debug)]
struct Queries {
    user_id_by_email: String,
    profile_by_id: String,
    profile_by_email: String,
    totals: String,
    append: String,
}

impl Queries {
    fn new(prefix: &str) -> Self {
        let users = format!("{prefix}users");
        let points = format!("{prefix}wc_points_rewards_user_points");
        // Only the most recent ledger row is joined
        let profile = format!(
            "SELECT u.user_email, p.points, p.points_balance, p.order_id \
             FROM {users} AS u \
             LEFT JOIN {points} AS p ON u.ID = p.user_id"
        );

        Self {
            user_id_by_email: format!("SELECT ID FROM {users} WHERE user_email = ? LIMIT 1"),
            profile_by_id: format!("{profile} WHERE u.ID = ? ORDER BY p.id DESC LIMIT 1"),
            profile_by_email: format!(
                "{profile} WHERE u.user_email = ? ORDER BY p.id DESC LIMIT 1"
            ),
            // SUM is an exact DECIMAL, range-checked in Rust
            totals: format!(
                "SELECT CAST(COALESCE(SUM(points), 0) AS CHAR) AS points, \
                 CAST(COALESCE(SUM(points_balance), 0) AS CHAR) AS points_balance \
                 FROM {points} WHERE user_id = ?"
            ),
            append: format!(
                "INSERT INTO {points} (user_id, points, points_balance, date) VALUES (?, ?, ?, ?)"
            ),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_email: String,
    points: Option<i64>,
    points_balance: Option<i64>,
    order_id: Option<i64>,
}

impl From<ProfileRow> for ProfileRecord {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_email: row.user_email,
            points: row.points,
            points_balance: row.points_balance,
            order_id: row.order_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    points: String,
    points_balance: String,
}

impl TotalsRow {
    fn into_totals(self, user_id: UserId) -> Result<PointsTotals, database::Error> {
        let parse = |sum: &str| {
            sum.parse::<i64>()
                .map_err(|_| database::Error::TotalsOutOfRange(user_id))
        };
        Ok(PointsTotals {
            points: parse(&self.points)?,
            points_balance: parse(&self.points_balance)?,
        })
    }
}

#[async_trait::async_trait]
impl PointsStore for MySqlDatabase {
    async fn profile_by_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<ProfileRecord>, database::Error> {
        let row: Option<ProfileRow> = sqlx::query_as(&self.queries.profile_by_id)
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn profile_by_email(
        &self,
        user_email: &str,
    ) -> Result<Option<ProfileRecord>, database::Error> {
        let row: Option<ProfileRow> = sqlx::query_as(&self.queries.profile_by_email)
            .bind(user_email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn totals(&self, user_id: UserId) -> Result<PointsTotals, database::Error> {
        // An aggregate without a GROUP BY always yields one row
        let row: TotalsRow = sqlx::query_as(&self.queries.totals)
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await?;

        row.into_totals(user_id)
    }

    async fn append(&self, user_id: UserId, delta: PointsDelta) -> Result<(), database::Error> {
        sqlx::query(&self.queries.append)
            .bind(user_id.get())
            .bind(delta.points)
            .bind(delta.points_balance)
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), database::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserDirectory for MySqlDatabase {
    async fn lookup_by_email(&self, user_email: &str) -> Result<Option<UserId>, directory::Error> {
        let id: Option<u64> = sqlx::query_scalar(&self.queries.user_id_by_email)
            .bind(user_email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id.and_then(UserId::new))
    }
}

impl From<sqlx::Error> for database::Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Adapter(Box::new(err))
    }
}

impl From<sqlx::Error> for directory::Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Adapter(Box::new(err))
    }
}
