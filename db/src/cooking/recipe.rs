use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::categories::{Category, RecipeCategory};
use super::ingredients::{escape_like, RecipeIngredient};
use super::steps::RecipeStep;
use crate::favorites::RecipeFavorite;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Recipe {
    pub recipe_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub servings: Option<i64>,
    pub prep_time: Option<i64>, // minutes
    pub cook_time: Option<i64>, // minutes
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSearch {
    pub max: Option<i64>,
    pub query: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipeSummary {
    pub recipe_id: Uuid,
    pub name: String,
    pub favorite_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeWithDetails {
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
    pub categories: Vec<Category>,
    pub favorite_count: i64,
    pub is_favorited: bool,
}

impl Recipe {
    /// Case-folded form of a recipe name, stored alongside it for searching.
    pub fn search_name(name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub async fn get_by_id(pool: &SqlitePool, recipe_id: Uuid) -> Result<Option<Self>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            "
            SELECT *
            FROM recipes
            WHERE recipe_id = ?
            ",
        )
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

        Ok(recipe)
    }

    pub async fn list_by_author(pool: &SqlitePool, author_user_id: Uuid) -> Result<Vec<Self>> {
        let recipes = sqlx::query_as::<_, Recipe>(
            "
            SELECT *
            FROM recipes
            WHERE author_user_id = ?
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(author_user_id)
        .fetch_all(pool)
        .await?;

        Ok(recipes)
    }

    /// Ingredients, steps, categories and favorites go with the recipe.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &SqlitePool, recipe_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn search(pool: &SqlitePool, search: &RecipeSearch) -> Result<Vec<RecipeSummary>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "
            SELECT
                r.recipe_id,
                r.name,
                (SELECT COUNT(*) FROM recipe_favorites f WHERE f.recipe_id = r.recipe_id) AS favorite_count
            FROM recipes r
            WHERE 1 = 1
            ",
        );

        if let Some(query) = search.query.as_deref().map(str::trim) {
            if !query.is_empty() {
                builder
                    .push(" AND r.search_name LIKE ")
                    .push_bind(format!("%{}%", escape_like(&Self::search_name(query))))
                    .push(r" ESCAPE '\'");
            }
        }

        if !search.categories.is_empty() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM recipe_categories rc WHERE rc.recipe_id = r.recipe_id AND lower(rc.category_id) IN (",
            );
            let mut ids = builder.separated(", ");
            for category in &search.categories {
                ids.push_bind(category.trim().to_lowercase());
            }
            ids.push_unseparated("))");
        }

        builder.push(" ORDER BY favorite_count DESC, r.name ASC");

        if let Some(max) = search.max {
            builder.push(" LIMIT ").push_bind(max.max(0));
        }

        let recipes = builder
            .build_query_as::<RecipeSummary>()
            .fetch_all(pool)
            .await?;

        Ok(recipes)
    }

    /// Loads a recipe with everything hanging off it. `viewer` decides `is_favorited`.
    pub async fn get_full(
        pool: &SqlitePool,
        recipe_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<RecipeWithDetails>> {
        let Some(recipe) = Self::get_by_id(pool, recipe_id).await? else {
            return Ok(None);
        };

        let ingredients = RecipeIngredient::get_by_recipe(pool, recipe_id).await?;
        let steps = RecipeStep::get_by_recipe(pool, recipe_id).await?;
        let categories = RecipeCategory::get_by_recipe(pool, recipe_id).await?;
        let favorite_count = RecipeFavorite::count_for_recipe(pool, recipe_id).await?;
        let is_favorited = match viewer {
            Some(user_id) => RecipeFavorite::is_favorited(pool, user_id, recipe_id).await?,
            None => false,
        };

        Ok(Some(RecipeWithDetails {
            recipe,
            ingredients,
            steps,
            categories,
            favorite_count,
            is_favorited,
        }))
    }
}
