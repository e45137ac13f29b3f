use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::{
    domain::{PointsDelta, UserId},
    ports::{database::PointsStore, directory::UserDirectory},
};

use super::{BoxFuture, DomainLogic, Error};

/// Accumulate points for a user identified by email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddPointsRequest {
    pub user_email: String,
    pub delta: PointsDelta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPointsResponse {
    pub user_id: UserId,
    pub user_email: String,
    /// Sum of every prior entry plus this request's delta
    pub points: i64,
    pub points_balance: i64,
}

impl<D, U> Service<AddPointsRequest> for DomainLogic<D, U>
where
    D: PointsStore + 'static,
    U: UserDirectory + 'static,
{
    type Response = AddPointsResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AddPointsRequest) -> Self::Future {
        let database = self.database.clone();
        let directory = self.directory.clone();
        Box::pin(async move {
            let user_id = directory
                .lookup_by_email(&req.user_email)
                .await?
                .ok_or(Error::UserNotFound)?;

            // Totals are read before the new entry exists and are not re-read afterwards
            let totals = database.totals(user_id).await?;
            let cumulative = totals.apply(req.delta).ok_or(Error::PointsOverflow)?;

            // The ledger stores the raw delta, never the cumulative figures
            database.append(user_id, req.delta).await?;

            info!(
                %user_id,
                delta_points = req.delta.points,
                delta_points_balance = req.delta.points_balance,
                points = cumulative.points,
                points_balance = cumulative.points_balance,
                "added points"
            );

            Ok(AddPointsResponse {
                user_id,
                user_email: req.user_email,
                points: cumulative.points,
                points_balance: cumulative.points_balance,
            })
        })
    }
}
