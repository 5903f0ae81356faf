use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    #[serde(rename = "id")]
    pub category_id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Derives a stable id from a display name, `"Weeknight Dinners"` becomes `"weeknight-dinners"`.
    pub fn slug_for(name: &str) -> String {
        name.split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>(
            "
            SELECT category_id, name, created_at, updated_at
            FROM categories
            ORDER BY name
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(pool: &SqlitePool, category_id: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>(
            "
            SELECT category_id, name, created_at, updated_at
            FROM categories
            WHERE category_id = ?
            ",
        )
        .bind(category_id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Inserts the category unless a category with this id already exists.
    pub async fn connect_or_create(
        conn: &mut SqliteConnection,
        category_id: &str,
        name: &str,
    ) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO categories (category_id, name)
            VALUES (?, ?)
            ON CONFLICT (category_id) DO NOTHING
            ",
        )
        .bind(category_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

pub struct RecipeCategory;

impl RecipeCategory {
    pub async fn get_by_recipe(pool: &SqlitePool, recipe_id: uuid::Uuid) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "
            SELECT
                c.category_id,
                c.name,
                c.created_at,
                c.updated_at
            FROM categories c
            JOIN recipe_categories rc ON c.category_id = rc.category_id
            WHERE rc.recipe_id = ?
            ORDER BY c.name
            ",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    pub(crate) async fn category_ids_for(
        conn: &mut SqliteConnection,
        recipe_id: uuid::Uuid,
    ) -> Result<Vec<String>> {
        let ids = sqlx::query_as::<_, (String,)>(
            "SELECT category_id FROM recipe_categories WHERE recipe_id = ?",
        )
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|(id,)| id)
        .collect();

        Ok(ids)
    }

    pub(crate) async fn connect(
        conn: &mut SqliteConnection,
        recipe_id: uuid::Uuid,
        category_id: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO recipe_categories (recipe_id, category_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(recipe_id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub(crate) async fn disconnect(
        conn: &mut SqliteConnection,
        recipe_id: uuid::Uuid,
        category_id: &str,
    ) -> Result<()> {
        sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = ? AND category_id = ?")
            .bind(recipe_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
