use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    commands::{
        AddPointsRequest, AddPointsResponse, DomainLogic, GetPointsRequest, GetPointsResponse,
        PointsRequest, PointsResponse,
    },
    domain::{PointsDelta, UserId},
    ports::{database::PointsStore, directory::UserDirectory},
};

use super::error::ApiError;

/// Query parameters of a read
///
/// Kept as raw strings so that a bad `user_id` produces our own error body.
#[derive(Debug, Default, Deserialize)]
pub struct PointsQuery {
    user_id: Option<String>,
    user_email: Option<String>,
}

impl PointsQuery {
    /// Empty values and a zero identifier count as absent
    pub fn into_request(self) -> Result<GetPointsRequest, ApiError> {
        let user_id = match self.user_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let id: u64 = raw.parse().map_err(|_| ApiError::InvalidUserId)?;
                UserId::new(id)
            }
        };

        Ok(GetPointsRequest {
            user_id,
            user_email: self.user_email.filter(|user_email| !user_email.is_empty()),
        })
    }
}

/// Parse the JSON body of an accumulate request
///
/// Point values may be JSON numbers or numeric strings, as long as they are whole.
pub fn parse_add_points(body: &[u8]) -> Result<AddPointsRequest, ApiError> {
    let body: Map<String, Value> =
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidBody)?;

    let user_email = body
        .get("user_email")
        .and_then(Value::as_str)
        .ok_or(ApiError::InvalidField("user_email"))?;

    Ok(AddPointsRequest {
        user_email: user_email.to_owned(),
        delta: PointsDelta {
            points: integer_field(&body, "points")?,
            points_balance: integer_field(&body, "points_balance")?,
        },
    })
}

/// The ledger columns are integers: `5.0` is accepted, `2.5` is not
fn integer_field(body: &Map<String, Value>, name: &'static str) -> Result<i64, ApiError> {
    let value = match body.get(name) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral)),
        Some(Value::String(raw)) => {
            let raw = raw.trim();
            raw.parse()
                .ok()
                .or_else(|| raw.parse().ok().and_then(integral))
        }
        _ => None,
    };

    value.ok_or(ApiError::InvalidField(name))
}

fn integral(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then_some(value as i64)
}

#[derive(Debug, Serialize)]
struct GetPointsBody {
    message: &'static str,
    user_id: UserId,
    user_email: String,
    points: Option<i64>,
    points_balance: Option<i64>,
    order_id: Option<i64>,
}

impl From<GetPointsResponse> for GetPointsBody {
    fn from(res: GetPointsResponse) -> Self {
        Self {
            message: "GET request processed successfully",
            user_id: res.user_id,
            user_email: res.user_email,
            points: res.points,
            points_balance: res.points_balance,
            order_id: res.order_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct AddPointsBody {
    message: &'static str,
    user_id: UserId,
    user_email: String,
    points: i64,
    points_balance: i64,
}

impl From<AddPointsResponse> for AddPointsBody {
    fn from(res: AddPointsResponse) -> Self {
        Self {
            message: "POST request processed successfully",
            user_id: res.user_id,
            user_email: res.user_email,
            points: res.points,
            points_balance: res.points_balance,
        }
    }
}

/// Single entry point of the points API
///
/// POST accumulates points, anything else routed here reads them.
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4(), method = %method))]
pub async fn handle_points_request<D, U>(
    State(logic): State<DomainLogic<D, U>>,
    method: Method,
    query: Result<Query<PointsQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, ApiError>
where
    D: PointsStore + 'static,
    U: UserDirectory + 'static,
{
    let req = if method == Method::POST {
        PointsRequest::Add(parse_add_points(&body)?)
    } else {
        let Query(query) = query.map_err(|_| ApiError::InvalidUserId)?;
        PointsRequest::Get(query.into_request()?)
    };

    let res = match ServiceExt::<PointsRequest>::oneshot(logic, req).await? {
        PointsResponse::Get(res) => Json(GetPointsBody::from(res)).into_response(),
        PointsResponse::Add(res) => Json(AddPointsBody::from(res)).into_response(),
    };

    Ok(res)
}
