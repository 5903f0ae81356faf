use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipeStep {
    pub step_id: Uuid,
    pub recipe_id: Uuid,
    pub step_number: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeStep {
    pub async fn get_by_recipe(pool: &SqlitePool, recipe_id: Uuid) -> Result<Vec<Self>> {
        let steps = sqlx::query_as::<_, RecipeStep>(
            "
            SELECT *
            FROM recipe_steps
            WHERE recipe_id = ?
            ORDER BY step_number
            ",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(steps)
    }

    pub(crate) async fn step_ids_for(
        conn: &mut SqliteConnection,
        recipe_id: Uuid,
    ) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_as::<_, (Uuid,)>(
            "SELECT step_id FROM recipe_steps WHERE recipe_id = ? ORDER BY step_number",
        )
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|(id,)| id)
        .collect();

        Ok(ids)
    }

    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        recipe_id: Uuid,
        step_number: i64,
        content: &str,
    ) -> Result<Uuid> {
        let step_id = Uuid::new_v4();

        sqlx::query(
            "
            INSERT INTO recipe_steps (step_id, recipe_id, step_number, content)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(step_id)
        .bind(recipe_id)
        .bind(step_number)
        .bind(content)
        .execute(&mut *conn)
        .await?;

        Ok(step_id)
    }

    pub(crate) async fn update(
        conn: &mut SqliteConnection,
        step_id: Uuid,
        step_number: i64,
        content: &str,
    ) -> Result<()> {
        sqlx::query(
            "
            UPDATE recipe_steps
            SET step_number = ?,
                content = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE step_id = ?
            ",
        )
        .bind(step_number)
        .bind(content)
        .bind(step_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub(crate) async fn delete(conn: &mut SqliteConnection, step_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM recipe_steps WHERE step_id = ?")
            .bind(step_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
