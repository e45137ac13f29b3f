use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower::Service;

use crate::ports::{database::PointsStore, directory::UserDirectory};

pub mod add_points;
pub mod get_points;

pub use add_points::{AddPointsRequest, AddPointsResponse};
pub use get_points::{GetPointsRequest, GetPointsResponse};

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send>>;

pub struct DomainLogic<D, U> {
    database: Arc<D>,
    directory: Arc<U>,
}

impl<D, U> DomainLogic<D, U> {
    pub fn new(database: Arc<D>, directory: Arc<U>) -> Self {
        Self {
            database,
            directory,
        }
    }

    pub fn database(&self) -> &D {
        &self.database
    }
}

// Manual impl: the ports are shared, they don't need to be `Clone` themselves
impl<D, U> Clone for DomainLogic<D, U> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            directory: self.directory.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database port error: {0:?}")]
    Database(#[from] crate::ports::database::Error),
    #[error("directory port error: {0:?}")]
    Directory(#[from] crate::ports::directory::Error),

    /// No usable user identifier, even after resolving the email
    #[error("missing or invalid user_id parameter")]
    InvalidUserId,
    #[error("missing user_id or user_email parameter")]
    MissingIdentifier,
    #[error("user not found")]
    UserNotFound,
    /// Cumulative totals would not fit in an `i64`
    #[error("points total out of range")]
    PointsOverflow,
}

/// Any request the points endpoint accepts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointsRequest {
    Get(GetPointsRequest),
    Add(AddPointsRequest),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointsResponse {
    Get(GetPointsResponse),
    Add(AddPointsResponse),
}

impl<D, U> Service<PointsRequest> for DomainLogic<D, U>
where
    D: PointsStore + 'static,
    U: UserDirectory + 'static,
{
    type Response = PointsResponse;
    type Error = Error;
    type Future = BoxFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: PointsRequest) -> Self::Future {
        match req {
            PointsRequest::Get(req) => {
                let fut = Service::<GetPointsRequest>::call(self, req);
                Box::pin(async move { fut.await.map(PointsResponse::Get) })
            }
            PointsRequest::Add(req) => {
                let fut = Service::<AddPointsRequest>::call(self, req);
                Box::pin(async move { fut.await.map(PointsResponse::Add) })
            }
        }
    }
}
