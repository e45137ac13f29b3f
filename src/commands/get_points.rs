use std::task::{Context, Poll};

use tower::Service;
use tracing::debug;

use crate::{
    domain::{ProfileLookup, UserId},
    ports::{database::PointsStore, directory::UserDirectory},
};

use super::{BoxFuture, DomainLogic, Error};

/// Read a user's points
///
/// Both fields are optional. If only the email is given, it is resolved through the directory
/// first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetPointsRequest {
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetPointsResponse {
    pub user_id: UserId,
    pub user_email: String,
    /// Points from the user's most recent ledger entry
    pub points: Option<i64>,
    pub points_balance: Option<i64>,
    pub order_id: Option<i64>,
}

impl<D, U> Service<GetPointsRequest> for DomainLogic<D, U>
where
    D: PointsStore + 'static,
    U: UserDirectory + 'static,
{
    type Response = GetPointsResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetPointsRequest) -> Self::Future {
        let database = self.database.clone();
        let directory = self.directory.clone();
        Box::pin(async move {
            // An email that doesn't resolve leaves the identifier absent
            let user_id = match (req.user_id, req.user_email.as_deref()) {
                (Some(user_id), _) => Some(user_id),
                (None, Some(user_email)) => directory.lookup_by_email(user_email).await?,
                (None, None) => None,
            };
            let user_id = user_id.ok_or(Error::InvalidUserId)?;

            let profile = match ProfileLookup::select(Some(user_id), req.user_email.as_deref())
                .ok_or(Error::MissingIdentifier)?
            {
                ProfileLookup::ById(user_id) => database.profile_by_id(user_id).await?,
                ProfileLookup::ByEmail(user_email) => database.profile_by_email(user_email).await?,
            }
            .ok_or(Error::UserNotFound)?;

            debug!(%user_id, "read points profile");

            Ok(GetPointsResponse {
                user_id,
                user_email: profile.user_email,
                points: profile.points,
                points_balance: profile.points_balance,
                order_id: profile.order_id,
            })
        })
    }
}
