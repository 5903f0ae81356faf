use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeFavorite {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RecipeFavorite {
    /// Marks or unmarks `recipe_id` as a favorite of `user_id`. Repeating either is a no-op.
    #[tracing::instrument(skip(pool), err)]
    pub async fn set(
        pool: &SqlitePool,
        user_id: Uuid,
        recipe_id: Uuid,
        is_favorited: bool,
    ) -> Result<()> {
        let query = if is_favorited {
            "INSERT OR IGNORE INTO recipe_favorites (user_id, recipe_id) VALUES (?, ?)"
        } else {
            "DELETE FROM recipe_favorites WHERE user_id = ? AND recipe_id = ?"
        };

        sqlx::query(query)
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn is_favorited(pool: &SqlitePool, user_id: Uuid, recipe_id: Uuid) -> Result<bool> {
        let (exists,): (i64,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM recipe_favorites WHERE user_id = ? AND recipe_id = ?)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(pool)
        .await?;

        Ok(exists != 0)
    }

    pub async fn count_for_recipe(pool: &SqlitePool, recipe_id: Uuid) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM recipe_favorites WHERE recipe_id = ?")
                .bind(recipe_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Most recently favorited first.
    pub async fn list_recipe_ids_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_as::<_, (Uuid,)>(
            "
            SELECT recipe_id
            FROM recipe_favorites
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(id,)| id)
        .collect();

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cooking::{Recipe, RecipeInput},
        users::User,
    };

    async fn recipe_named(pool: &SqlitePool, author: Uuid, name: &str) -> Uuid {
        Recipe::create_with_details(pool, author, RecipeInput::named(name))
            .await
            .unwrap()
            .recipe_id
    }

    #[sqlx::test]
    async fn favoriting_is_idempotent(pool: SqlitePool) {
        let user = User::create(&pool, "julia", "souffle").await.unwrap();
        let recipe_id = recipe_named(&pool, user.user_id, "Boeuf Bourguignon").await;

        RecipeFavorite::set(&pool, user.user_id, recipe_id, true).await.unwrap();
        RecipeFavorite::set(&pool, user.user_id, recipe_id, true).await.unwrap();

        assert!(RecipeFavorite::is_favorited(&pool, user.user_id, recipe_id).await.unwrap());
        assert_eq!(RecipeFavorite::count_for_recipe(&pool, recipe_id).await.unwrap(), 1);

        RecipeFavorite::set(&pool, user.user_id, recipe_id, false).await.unwrap();
        RecipeFavorite::set(&pool, user.user_id, recipe_id, false).await.unwrap();

        assert!(!RecipeFavorite::is_favorited(&pool, user.user_id, recipe_id).await.unwrap());
        assert_eq!(RecipeFavorite::count_for_recipe(&pool, recipe_id).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn lists_favorites_for_a_user(pool: SqlitePool) {
        let julia = User::create(&pool, "julia", "souffle").await.unwrap();
        let jacques = User::create(&pool, "jacques", "omelette").await.unwrap();
        let stew = recipe_named(&pool, julia.user_id, "Stew").await;
        let tart = recipe_named(&pool, julia.user_id, "Tart").await;

        RecipeFavorite::set(&pool, jacques.user_id, stew, true).await.unwrap();
        RecipeFavorite::set(&pool, jacques.user_id, tart, true).await.unwrap();
        RecipeFavorite::set(&pool, julia.user_id, tart, true).await.unwrap();

        let ids = RecipeFavorite::list_recipe_ids_for_user(&pool, jacques.user_id)
            .await
            .unwrap();
        assert_eq!(ids, vec![tart, stew]);

        let ids = RecipeFavorite::list_recipe_ids_for_user(&pool, julia.user_id)
            .await
            .unwrap();
        assert_eq!(ids, vec![tart]);
    }

    #[sqlx::test]
    async fn deleting_a_recipe_removes_its_favorites(pool: SqlitePool) {
        let user = User::create(&pool, "julia", "souffle").await.unwrap();
        let recipe_id = recipe_named(&pool, user.user_id, "Stew").await;
        RecipeFavorite::set(&pool, user.user_id, recipe_id, true).await.unwrap();

        Recipe::delete(&pool, recipe_id).await.unwrap();

        let ids = RecipeFavorite::list_recipe_ids_for_user(&pool, user.user_id)
            .await
            .unwrap();
        assert!(ids.is_empty());
    }
}
