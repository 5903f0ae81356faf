use db::cooking::Category;

use crate::Result;

pub(crate) const DEFAULT_CATEGORIES: &[&str] = &[
    "Breakfast",
    "Lunch",
    "Dinner",
    "Dessert",
    "Snack",
    "Vegetarian",
    "Vegan",
    "Gluten Free",
    "Quick",
];

pub(crate) async fn seed() -> Result<()> {
    let pool = db::setup_db_pool().await?;

    let created = seed_categories(&pool).await?;
    println!("Seeded {created} categories");

    Ok(())
}

#[tracing::instrument(skip(pool), err)]
pub(crate) async fn seed_categories(pool: &db::SqlitePool) -> Result<usize> {
    let mut conn = pool.acquire().await?;

    for name in DEFAULT_CATEGORIES {
        Category::connect_or_create(&mut conn, &Category::slug_for(name), name).await?;
    }

    Ok(DEFAULT_CATEGORIES.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../db/migrations")]
    async fn seeding_twice_keeps_one_of_each(pool: db::SqlitePool) {
        seed_categories(&pool).await.unwrap();
        seed_categories(&pool).await.unwrap();

        let categories = Category::list_all(&pool).await.unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert!(categories
            .iter()
            .any(|c| c.category_id == "gluten-free" && c.name == "Gluten Free"));
    }
}
