use axum::{body::Body, extract::FromRequestParts, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use http::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::app_state::AppState as AS;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct DBSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    NotLoggedIn,
    Expired,
    Unavailable,
}

impl SessionRejection {
    fn message(self) -> &'static str {
        match self {
            Self::NotLoggedIn => "Not logged in",
            Self::Expired => "Session expired",
            Self::Unavailable => "Session store unavailable",
        }
    }
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response<Body> {
        let status = match self {
            Self::NotLoggedIn | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(serde_json::json!({ "message": self.message() })),
        )
            .into_response()
    }
}

impl<AppState: AS> FromRequestParts<AppState> for DBSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| {
                tracing::error!("Failed to get cookies: {msg}");

                SessionRejection::Unavailable
            })?;

        let private = cookies.private(state.cookie_key());

        let Some(session_cookie) = private.get(SESSION_COOKIE) else {
            return Err(SessionRejection::NotLoggedIn);
        };

        let session_id = session_cookie.value().to_string();
        let Ok(session_id) = Uuid::parse_str(&session_id) else {
            tracing::error!("Failed to parse session id: {session_id}");

            return Err(SessionRejection::NotLoggedIn);
        };

        let session = sqlx::query_as::<_, DBSession>(
            r"
        SELECT *
        FROM Sessions
        WHERE session_id = ?
        ",
        )
        .bind(session_id)
        .fetch_optional(state.db())
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch session: {e}");

            SessionRejection::Unavailable
        })?;

        let Some(session) = session else {
            return Err(SessionRejection::NotLoggedIn);
        };

        if session.is_expired(state.session_ttl(), Utc::now()) {
            tracing::debug!(session_id = %session.session_id, "Rejecting expired session");

            return Err(SessionRejection::Expired);
        }

        Ok(session)
    }
}

impl DBSession {
    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.updated_at + ttl < now
    }

    pub async fn create<AppState: AS>(
        user_id: Uuid,
        app_state: &AppState,
        cookies: &Cookies,
    ) -> color_eyre::Result<Self> {
        let session = sqlx::query_as::<_, DBSession>(
            r"
        INSERT INTO Sessions (session_id, user_id)
        VALUES (?, ?)
        RETURNING *
        ",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(app_state.db())
        .await?;

        let private = cookies.private(app_state.cookie_key());

        let session_cookie =
            tower_cookies::Cookie::build((SESSION_COOKIE, session.session_id.to_string()))
                .path("/")
                .http_only(true)
                .secure(true)
                .expires(None);
        private.add(session_cookie.into());

        Ok(session)
    }

    pub async fn destroy<AppState: AS>(
        self,
        app_state: &AppState,
        cookies: &Cookies,
    ) -> color_eyre::Result<()> {
        sqlx::query("DELETE FROM Sessions WHERE session_id = ?")
            .bind(self.session_id)
            .execute(app_state.db())
            .await?;

        let private = cookies.private(app_state.cookie_key());
        private.remove(tower_cookies::Cookie::build(SESSION_COOKIE).path("/").into());

        Ok(())
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete_expired(
        pool: &sqlx::SqlitePool,
        ttl: chrono::Duration,
    ) -> color_eyre::Result<u64> {
        let result = sqlx::query("DELETE FROM Sessions WHERE updated_at < datetime('now', ?)")
            .bind(format!("-{} seconds", ttl.num_seconds()))
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_updated_at(updated_at: DateTime<Utc>) -> DBSession {
        DBSession {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            updated_at,
            created_at: updated_at,
        }
    }

    #[test]
    fn fresh_session_is_not_expired() {
        let now = Utc::now();
        let session = session_updated_at(now - chrono::Duration::days(1));

        assert!(!session.is_expired(chrono::Duration::days(30), now));
    }

    #[test]
    fn stale_session_is_expired() {
        let now = Utc::now();
        let session = session_updated_at(now - chrono::Duration::days(31));

        assert!(session.is_expired(chrono::Duration::days(30), now));
    }

    #[test]
    fn rejections_are_unauthorized() {
        let response = SessionRejection::NotLoggedIn.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = SessionRejection::Expired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = SessionRejection::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
