use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, on, MethodFilter},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{
    commands::DomainLogic,
    ports::{database::PointsStore, directory::UserDirectory},
};

pub mod dispatch;
pub mod error;

pub const POINTS_ROUTE: &str = "/wp-json/wc/v3/points-and-rewards";

pub fn router<D, U>(logic: DomainLogic<D, U>) -> Router
where
    D: PointsStore + 'static,
    U: UserDirectory + 'static,
{
    Router::new()
        .route(
            POINTS_ROUTE,
            on(
                MethodFilter::GET.or(MethodFilter::POST),
                dispatch::handle_points_request::<D, U>,
            ),
        )
        .route("/health", get(health::<D, U>))
        .layer(TraceLayer::new_for_http())
        .with_state(logic)
}

async fn health<D, U>(State(logic): State<DomainLogic<D, U>>) -> (StatusCode, Json<Value>)
where
    D: PointsStore + 'static,
    U: UserDirectory + 'static,
{
    match logic.database().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            warn!(error = %err, "points store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase,
        domain::{PointsDelta, UserId},
        ports::database::{Error as DatabaseError, MockPointsStore},
    };
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    const ALICE_ID: u64 = 17;

    /// Alice has two prior entries: (10, 5) and (20, 0)
    #[fixture]
    fn database() -> MemoryDatabase {
        let alice = UserId::new(ALICE_ID).unwrap();
        let database = MemoryDatabase::default()
            .with_user(alice, "alice@example.com")
            .with_user(UserId::new(18).unwrap(), "bob@example.com");
        database
            .record(crate::domain::LedgerEntry::new(
                alice,
                PointsDelta {
                    points: 10,
                    points_balance: 5,
                },
            ))
            .unwrap();
        database
            .record(crate::domain::LedgerEntry::new(
                alice,
                PointsDelta {
                    points: 20,
                    points_balance: 0,
                },
            ))
            .unwrap();
        database
    }

    fn app(database: MemoryDatabase) -> Router {
        let database = Arc::new(database);
        router(DomainLogic::new(database.clone(), database))
    }

    fn get_request(query: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(format!("{POINTS_ROUTE}{query}"))
            .body(Body::empty())
            .unwrap()
    }

    fn post_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(POINTS_ROUTE)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> Result<(StatusCode, Value), BoxError> {
        let res = app.clone().oneshot(req).await?;
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[rstest]
    #[tokio::test]
    async fn test_post_then_get(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);

        // WHEN posting a delta for alice
        let (status, body) = send(
            &app,
            post_request(r#"{"user_email":"alice@example.com","points":5,"points_balance":1}"#),
        )
        .await?;

        // THEN the response carries the cumulative figures
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body).is_equal_to(json!({
            "message": "POST request processed successfully",
            "user_id": ALICE_ID,
            "user_email": "alice@example.com",
            "points": 35,
            "points_balance": 6,
        }));

        // AND a read reports the latest entry rather than the sum
        let (status, body) = send(&app, get_request("?user_email=alice%40example.com")).await?;
        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body).is_equal_to(json!({
            "message": "GET request processed successfully",
            "user_id": ALICE_ID,
            "user_email": "alice@example.com",
            "points": 5,
            "points_balance": 1,
            "order_id": null,
        }));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_post_twice(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);
        let body = r#"{"user_email":"bob@example.com","points":2,"points_balance":2}"#;

        let (_, first) = send(&app, post_request(body)).await?;
        let (_, second) = send(&app, post_request(body)).await?;

        assert_that!(first["points"]).is_equal_to(json!(2));
        assert_that!(second["points"]).is_equal_to(json!(4));
        assert_that!(second["points_balance"]).is_equal_to(json!(4));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_post_integral_float(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);

        let (status, body) = send(
            &app,
            post_request(r#"{"user_email":"alice@example.com","points":5.0,"points_balance":"1"}"#),
        )
        .await?;

        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["points"]).is_equal_to(json!(35));
        assert_that!(body["points_balance"]).is_equal_to(json!(6));

        Ok(())
    }

    #[rstest]
    #[case("?user_id=17")]
    #[case("?user_id=17&user_email=bob%40example.com")]
    #[case("?user_id=0&user_email=alice%40example.com")]
    #[case("?user_id=&user_email=alice%40example.com")]
    #[tokio::test]
    async fn test_get_alice(database: MemoryDatabase, #[case] query: &str) -> Result<(), BoxError> {
        let app = app(database);

        let (status, body) = send(&app, get_request(query)).await?;

        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["user_id"]).is_equal_to(json!(ALICE_ID));
        assert_that!(body["user_email"]).is_equal_to(json!("alice@example.com"));
        assert_that!(body["points"]).is_equal_to(json!(20));
        assert_that!(body["points_balance"]).is_equal_to(json!(0));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_without_entries(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);

        let (status, body) = send(&app, get_request("?user_id=18")).await?;

        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body["user_email"]).is_equal_to(json!("bob@example.com"));
        assert_that!(body["points"]).is_equal_to(Value::Null);
        assert_that!(body["order_id"]).is_equal_to(Value::Null);

        Ok(())
    }

    #[rstest]
    #[case("")]
    #[case("?user_email=")]
    #[case("?user_email=nobody%40example.com")]
    #[case("?user_id=abc")]
    #[case("?user_id=-1&user_email=alice%40example.com")]
    #[tokio::test]
    async fn test_get_bad_request(
        database: MemoryDatabase,
        #[case] query: &str,
    ) -> Result<(), BoxError> {
        let app = app(database);

        let (status, body) = send(&app, get_request(query)).await?;

        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(body).is_equal_to(json!({
            "error": "Missing or invalid user_id parameter"
        }));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_unknown_id(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);

        let (status, body) = send(&app, get_request("?user_id=999")).await?;

        assert_that!(status).is_equal_to(StatusCode::NOT_FOUND);
        assert_that!(body).is_equal_to(json!({ "error": "User not found" }));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_post_unknown_user(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database.clone());

        let (status, body) = send(
            &app,
            post_request(r#"{"user_email":"nobody@example.com","points":5,"points_balance":1}"#),
        )
        .await?;

        assert_that!(status).is_equal_to(StatusCode::NOT_FOUND);
        assert_that!(body).is_equal_to(json!({ "error": "User not found" }));

        Ok(())
    }

    #[rstest]
    #[case(
        r#"{"user_email":"alice@example.com","points_balance":1}"#,
        "Missing or invalid points parameter"
    )]
    #[case(
        r#"{"user_email":"alice@example.com","points":1}"#,
        "Missing or invalid points_balance parameter"
    )]
    #[case(
        r#"{"user_email":"alice@example.com","points":2.5,"points_balance":1}"#,
        "Missing or invalid points parameter"
    )]
    #[case(r#"{"points":1,"points_balance":1}"#, "Missing or invalid user_email parameter")]
    #[case("{", "Invalid JSON body")]
    #[tokio::test]
    async fn test_post_bad_request(
        database: MemoryDatabase,
        #[case] body: &str,
        #[case] message: &str,
    ) -> Result<(), BoxError> {
        let alice = UserId::new(ALICE_ID).unwrap();
        let app = app(database.clone());

        let (status, res) = send(&app, post_request(body)).await?;

        // Nothing reaches the ledger
        assert_that!(status).is_equal_to(StatusCode::BAD_REQUEST);
        assert_that!(res).is_equal_to(json!({ "error": message }));
        let entries = database.entries(alice)?;
        assert_that!(entries).has_length(2);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_storage_failure() -> Result<(), BoxError> {
        let mut store = MockPointsStore::new();
        store
            .expect_profile_by_id()
            .returning(|_| Err(DatabaseError::Adapter("connection reset".into())));
        let app = router(DomainLogic::new(
            Arc::new(store),
            Arc::new(MemoryDatabase::default()),
        ));

        let (status, body) = send(&app, get_request("?user_id=3")).await?;

        assert_that!(status).is_equal_to(StatusCode::INTERNAL_SERVER_ERROR);
        assert_that!(body).is_equal_to(json!({ "error": "Internal server error" }));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_method_not_allowed(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);
        let req = Request::builder()
            .method(Method::DELETE)
            .uri(POINTS_ROUTE)
            .body(Body::empty())?;

        let res = app.oneshot(req).await?;

        assert_that!(res.status()).is_equal_to(StatusCode::METHOD_NOT_ALLOWED);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_health(database: MemoryDatabase) -> Result<(), BoxError> {
        let app = app(database);
        let req = Request::builder().uri("/health").body(Body::empty())?;

        let (status, body) = send(&app, req).await?;

        assert_that!(status).is_equal_to(StatusCode::OK);
        assert_that!(body).is_equal_to(json!({ "status": "ok" }));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_degraded() -> Result<(), BoxError> {
        let mut store = MockPointsStore::new();
        store
            .expect_ping()
            .returning(|| Err(DatabaseError::Adapter("connection refused".into())));
        let app = router(DomainLogic::new(
            Arc::new(store),
            Arc::new(MemoryDatabase::default()),
        ));
        let req = Request::builder().uri("/health").body(Body::empty())?;

        let (status, body) = send(&app, req).await?;

        assert_that!(status).is_equal_to(StatusCode::SERVICE_UNAVAILABLE);
        assert_that!(body).is_equal_to(json!({ "status": "degraded" }));

        Ok(())
    }
}
