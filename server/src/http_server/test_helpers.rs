use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use cja::server::cookies::CookieKey;
use db::{users::PublicUser, SqlitePool};
use serde::de::DeserializeOwned;
use tower::ServiceExt as _;
use url::Url;

use crate::{http_server::routes::make_router, state::AppConfig, AppState};

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState {
        app: AppConfig {
            base_url: Url::parse("http://localhost:3000").unwrap(),
            session_ttl_days: 30,
        },
        db: pool,
        cookie_key: CookieKey(cja::tower_cookies::Key::generate()),
    }
}

/// The full router with the same layers `serve` runs it with.
pub fn create_test_app(pool: SqlitePool) -> Router {
    cja::server::layers(make_router().with_state(test_state(pool)))
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: &serde_json::Value,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder.body(Body::empty()).unwrap()
}

/// The `name=value` pair of the session cookie a response sets, ready to send back.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("session_id="))
        .map(ToString::to_string)
}

/// Registers `username` and returns the user with a cookie for their session.
pub async fn register(app: &Router, username: &str) -> (PublicUser, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            &serde_json::json!({ "username": username, "password": "password123" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    let cookie = session_cookie(&response).unwrap();
    let user = response_body_json(response).await;

    (user, cookie)
}

pub async fn response_body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}
