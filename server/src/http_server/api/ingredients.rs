use axum::{
    extract::{Query, State},
    Json,
};
use color_eyre::eyre::Context;
use db::cooking::{Ingredient, IngredientSummary};
use serde::Deserialize;

use crate::{http_server::ResponseResult, AppState};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientSearchParams {
    #[serde(default)]
    pub name: String,
}

/// Ingredients already in the catalogue, for the ingredient picker.
pub async fn search_ingredients(
    State(state): State<AppState>,
    Query(params): Query<IngredientSearchParams>,
) -> ResponseResult<Json<Vec<IngredientSummary>>> {
    let ingredients = Ingredient::search(&state.db, &params.name)
        .await
        .context("Failed to search ingredients")?;

    Ok(Json(ingredients))
}
