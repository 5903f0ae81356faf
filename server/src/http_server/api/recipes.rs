use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Query;
use color_eyre::eyre::{eyre, Context};
use db::{
    cooking::{Category, Recipe, RecipeSearch, RecipeSummary, RecipeWithDetails},
    favorites::RecipeFavorite,
    users::{Author, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    http_server::{
        current_user::{CurrentUser, MaybeCurrentUser},
        errors::WithStatus as _,
        json_body::JsonBody,
        ResponseResult,
    },
    recipes::{RecipeForm, RecipeRequest},
    AppState,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeListParams {
    pub max: Option<i64>,
    pub query: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// A recipe with everything the detail page shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullRecipe {
    #[serde(flatten)]
    pub details: RecipeWithDetails,
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRequest {
    pub is_favorited: bool,
}

pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<RecipeListParams>,
) -> ResponseResult<Json<Vec<RecipeSummary>>> {
    let search = RecipeSearch {
        max: params.max,
        query: params.query,
        categories: params.categories,
    };

    let recipes = Recipe::search(&state.db, &search)
        .await
        .context("Failed to search recipes")?;

    Ok(Json(recipes))
}

pub async fn list_categories(State(state): State<AppState>) -> ResponseResult<Json<Vec<Category>>> {
    let categories = Category::list_all(&state.db)
        .await
        .context("Failed to list categories")?;

    Ok(Json(categories))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeCurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<Json<FullRecipe>> {
    let recipe = load_full_recipe(&state, recipe_id, viewer.user_id()).await?;

    Ok(Json(recipe))
}

/// The recipe as the edit form starts out.
pub async fn recipe_form(
    State(state): State<AppState>,
    viewer: MaybeCurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<Json<RecipeForm>> {
    let recipe = load_full_recipe(&state, recipe_id, viewer.user_id()).await?;

    Ok(Json(RecipeForm::from_recipe(Some(&recipe.details))))
}

#[tracing::instrument(skip_all, fields(user.id = %current_user.user.user_id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    JsonBody(request): JsonBody<RecipeRequest>,
) -> ResponseResult<impl IntoResponse> {
    request.validate().with_status(StatusCode::BAD_REQUEST)?;

    let recipe = Recipe::create_with_details(&state.db, current_user.user.user_id, request.into())
        .await
        .context("Failed to create recipe")?;

    let full = load_full_recipe(&state, recipe.recipe_id, Some(current_user.user.user_id)).await?;
    let location = state
        .app
        .app_url(&format!("/api/recipes/{}", recipe.recipe_id));

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(full),
    ))
}

#[tracing::instrument(skip_all, fields(recipe.id = %recipe_id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    JsonBody(request): JsonBody<RecipeRequest>,
) -> ResponseResult<Json<FullRecipe>> {
    authorize_author(&state, recipe_id, &current_user).await?;
    request.validate().with_status(StatusCode::BAD_REQUEST)?;

    Recipe::update_with_details(&state.db, recipe_id, request.into())
        .await
        .context("Failed to update recipe")?
        .ok_or_else(|| eyre!("Recipe not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    let full = load_full_recipe(&state, recipe_id, Some(current_user.user.user_id)).await?;

    Ok(Json(full))
}

#[tracing::instrument(skip_all, fields(recipe.id = %recipe_id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<StatusCode> {
    authorize_author(&state, recipe_id, &current_user).await?;

    Recipe::delete(&state.db, recipe_id)
        .await
        .context("Failed to delete recipe")?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_favorite(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    JsonBody(request): JsonBody<FavoriteRequest>,
) -> ResponseResult<StatusCode> {
    find_recipe(&state, recipe_id).await?;

    RecipeFavorite::set(
        &state.db,
        current_user.user.user_id,
        recipe_id,
        request.is_favorited,
    )
    .await
    .context("Failed to update favorite")?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_recipe(state: &AppState, recipe_id: Uuid) -> ResponseResult<Recipe> {
    Recipe::get_by_id(&state.db, recipe_id)
        .await
        .context("Failed to fetch recipe")?
        .ok_or_else(|| eyre!("Recipe not found"))
        .with_status(StatusCode::NOT_FOUND)
}

/// Only the author may change or delete a recipe. Recipes whose author was deleted are frozen.
async fn authorize_author(
    state: &AppState,
    recipe_id: Uuid,
    current_user: &CurrentUser,
) -> ResponseResult<Recipe> {
    let recipe = find_recipe(state, recipe_id).await?;

    if recipe.author_user_id != Some(current_user.user.user_id) {
        return Err(eyre!("Only the author can change this recipe")).with_status(StatusCode::FORBIDDEN);
    }

    Ok(recipe)
}

async fn load_full_recipe(
    state: &AppState,
    recipe_id: Uuid,
    viewer: Option<Uuid>,
) -> ResponseResult<FullRecipe> {
    let details = Recipe::get_full(&state.db, recipe_id, viewer)
        .await
        .context("Failed to fetch recipe")?
        .ok_or_else(|| eyre!("Recipe not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    let author = match details.recipe.author_user_id {
        Some(author_id) => User::get_by_id(&state.db, author_id)
            .await
            .context("Failed to fetch recipe author")?
            .map(|user| user.to_author()),
        None => None,
    };

    Ok(FullRecipe { details, author })
}
