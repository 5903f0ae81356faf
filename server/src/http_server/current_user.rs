use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use cja::server::session::{DBSession, SessionRejection};
use db::users::User;

use crate::AppState;

pub struct CurrentUser {
    pub user: User,
    pub session: DBSession,
}

#[derive(Debug)]
pub enum CurrentUserError {
    Session(SessionRejection),
    UserMissing,
    DBError(color_eyre::Report),
}

impl From<SessionRejection> for CurrentUserError {
    fn from(value: SessionRejection) -> Self {
        Self::Session(value)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = CurrentUserError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = DBSession::from_request_parts(parts, state).await?;

        let user = User::get_by_id(&state.db, session.user_id)
            .await
            .map_err(CurrentUserError::DBError)?
            .ok_or(CurrentUserError::UserMissing)?;

        Ok(Self { user, session })
    }
}

impl IntoResponse for CurrentUserError {
    fn into_response(self) -> Response<Body> {
        match self {
            Self::Session(rejection) => rejection.into_response(),
            Self::UserMissing => SessionRejection::NotLoggedIn.into_response(),
            Self::DBError(e) => {
                tracing::error!(error = ?e, "CurrentUserError");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// For routes that work for everyone but show more to a signed in user.
pub struct MaybeCurrentUser(pub Option<CurrentUser>);

impl MaybeCurrentUser {
    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|current| current.user.user_id)
    }
}

impl FromRequestParts<AppState> for MaybeCurrentUser {
    type Rejection = CurrentUserError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(current_user) => Ok(Self(Some(current_user))),
            Err(CurrentUserError::Session(SessionRejection::Unavailable)) => Err(
                CurrentUserError::Session(SessionRejection::Unavailable),
            ),
            Err(CurrentUserError::Session(_) | CurrentUserError::UserMissing) => Ok(Self(None)),
            Err(e @ CurrentUserError::DBError(_)) => Err(e),
        }
    }
}
