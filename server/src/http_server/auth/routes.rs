use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cja::{server::session::DBSession, tower_cookies::Cookies};
use color_eyre::eyre::{eyre, Context};
use db::{
    is_unique_violation,
    users::{PublicUser, User},
};
use serde::{Deserialize, Serialize};

use crate::{
    http_server::{
        current_user::CurrentUser, errors::WithStatus as _, json_body::JsonBody, ResponseResult,
    },
    validation::{ValidationError, ValidationErrors, MIN_PASSWORD_LENGTH},
    AppState,
};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.username.trim().is_empty() {
            errors.push(ValidationError::UsernameRequired);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(ValidationError::PasswordTooShort);
        }

        ValidationErrors::check(errors)
    }
}

/// Creates the account and signs it in.
#[tracing::instrument(skip_all, fields(username = %credentials.username))]
async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ResponseResult<impl IntoResponse> {
    credentials
        .validate()
        .with_status(StatusCode::BAD_REQUEST)?;

    let existing = User::get_by_username(&state.db, &credentials.username)
        .await
        .context("Failed to look up username")?;
    if existing.is_some() {
        return Err(eyre!("Username already taken")).with_status(StatusCode::CONFLICT);
    }

    let user = match User::create(&state.db, &credentials.username, &credentials.password).await {
        Ok(user) => user,
        // Lost a race with another registration for the same name
        Err(err) if is_unique_violation(&err) => {
            return Err(eyre!("Username already taken")).with_status(StatusCode::CONFLICT);
        }
        Err(err) => return Err(err.wrap_err("Failed to create user").into()),
    };

    DBSession::create(user.user_id, &state, &cookies)
        .await
        .context("Failed to start session")?;

    tracing::info!(user.id = %user.user_id, "Registered user");

    Ok((StatusCode::CREATED, Json(user.to_public())))
}

#[tracing::instrument(skip_all, fields(username = %credentials.username))]
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ResponseResult<Json<PublicUser>> {
    let user = User::get_by_username(&state.db, &credentials.username)
        .await
        .context("Failed to look up user")?
        .filter(|user| user.verify_password(&credentials.password))
        .ok_or_else(|| eyre!("invalid credentials"))
        .with_status(StatusCode::UNAUTHORIZED)?;

    DBSession::create(user.user_id, &state, &cookies)
        .await
        .context("Failed to start session")?;

    Ok(Json(user.to_public()))
}

async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    session: DBSession,
) -> ResponseResult<StatusCode> {
    session
        .destroy(&state, &cookies)
        .await
        .context("Failed to end session")?;

    Ok(StatusCode::NO_CONTENT)
}

async fn me(current_user: CurrentUser) -> Json<PublicUser> {
    Json(current_user.user.to_public())
}
