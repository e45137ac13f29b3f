use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::commands;

/// Error returned to API clients as `{"error": "<message>"}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing or invalid user_id parameter")]
    InvalidUserId,
    #[error("Missing user_id or user_email parameter")]
    MissingIdentifier,
    #[error("Missing or invalid {0} parameter")]
    InvalidField(&'static str),
    #[error("Invalid JSON body")]
    InvalidBody,
    #[error("Points total out of range")]
    PointsOverflow,
    #[error("User not found")]
    UserNotFound,
    /// Details are logged, never returned
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUserId
            | ApiError::MissingIdentifier
            | ApiError::InvalidField(_)
            | ApiError::InvalidBody
            | ApiError::PointsOverflow => StatusCode::BAD_REQUEST,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<commands::Error> for ApiError {
    fn from(err: commands::Error) -> Self {
        match err {
            commands::Error::InvalidUserId => ApiError::InvalidUserId,
            commands::Error::MissingIdentifier => ApiError::MissingIdentifier,
            commands::Error::UserNotFound => ApiError::UserNotFound,
            commands::Error::PointsOverflow => ApiError::PointsOverflow,
            commands::Error::Database(_) | commands::Error::Directory(_) => {
                error!(error = %err, "points request failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
