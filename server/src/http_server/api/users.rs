use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use color_eyre::eyre::{eyre, Context};
use db::{
    cooking::Recipe,
    favorites::RecipeFavorite,
    users::{PublicUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    http_server::{errors::WithStatus as _, ResponseResult},
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: PublicUser,
    pub favorites: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub user: UserProfile,
    pub recipes: Vec<Recipe>,
}

/// A profile with the recipes this user wrote and the ones they favorited.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ResponseResult<Json<UserPage>> {
    let user = User::get_by_id(&state.db, user_id)
        .await
        .context("Failed to fetch user")?
        .ok_or_else(|| eyre!("User not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    let favorites = RecipeFavorite::list_recipe_ids_for_user(&state.db, user_id)
        .await
        .context("Failed to fetch favorites")?;
    let recipes = Recipe::list_by_author(&state.db, user_id)
        .await
        .context("Failed to fetch recipes")?;

    Ok(Json(UserPage {
        user: UserProfile {
            user: user.to_public(),
            favorites,
        },
        recipes,
    }))
}
