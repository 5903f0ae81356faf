//! Creating recipes and reconciling edits against what is already stored.
//!
//! The diffing is done by the `plan_*` functions, which are pure. The
//! `Recipe::*_with_details` methods resolve ids, ask for a plan and then apply
//! it inside a single transaction.

use std::collections::HashSet;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::categories::{Category, RecipeCategory};
use super::ingredients::{Ingredient, RecipeIngredient};
use super::recipe::Recipe;
use super::steps::RecipeStep;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecipeInput {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub servings: Option<i64>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    /// `None` leaves the stored ingredients alone, `Some(vec![])` clears them.
    pub ingredients: Option<Vec<IngredientInput>>,
    pub steps: Option<Vec<StepInput>>,
    pub categories: Option<Vec<CategoryInput>>,
}

impl RecipeInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngredientInput {
    pub ingredient_id: Option<Uuid>,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepInput {
    pub step_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryInput {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngredientUpsert {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientChanges {
    pub delete: Vec<Uuid>,
    pub upsert: Vec<IngredientUpsert>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpdate {
    pub step_id: Uuid,
    pub step_number: i64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInsert {
    pub step_number: i64,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepChanges {
    pub delete: Vec<Uuid>,
    pub update: Vec<StepUpdate>,
    pub insert: Vec<StepInsert>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChanges {
    pub connect: Vec<CategoryInput>,
    pub disconnect: Vec<String>,
}

/// `incoming` pairs each submitted ingredient with the catalogue id its name resolved to.
///
/// A catalogue id that shows up twice keeps its first position and values.
pub fn plan_ingredient_changes(
    existing: &[Uuid],
    incoming: &[(Uuid, &IngredientInput)],
) -> IngredientChanges {
    let mut seen = HashSet::new();
    let mut upsert = Vec::with_capacity(incoming.len());

    for (ingredient_id, input) in incoming {
        if !seen.insert(*ingredient_id) {
            continue;
        }

        upsert.push(IngredientUpsert {
            ingredient_id: *ingredient_id,
            name: input.name.trim().to_string(),
            quantity: input.quantity,
            unit: input
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .map(ToString::to_string),
            display_order: position(upsert.len()),
        });
    }

    let delete = existing
        .iter()
        .filter(|id| !seen.contains(*id))
        .copied()
        .collect();

    IngredientChanges { delete, upsert }
}

/// Steps keep their row when they come back with an id this recipe owns.
/// Anything else is a new step. Numbering follows `incoming`, starting at 1.
pub fn plan_step_changes(existing: &[Uuid], incoming: &[StepInput]) -> StepChanges {
    let owned: HashSet<Uuid> = existing.iter().copied().collect();
    let mut kept = HashSet::new();
    let mut changes = StepChanges::default();

    for (index, step) in incoming.iter().enumerate() {
        let step_number = position(index) + 1;
        let content = step.content.trim().to_string();

        match step.step_id {
            Some(step_id) if owned.contains(&step_id) && kept.insert(step_id) => {
                changes.update.push(StepUpdate {
                    step_id,
                    step_number,
                    content,
                });
            }
            _ => changes.insert.push(StepInsert {
                step_number,
                content,
            }),
        }
    }

    changes.delete = existing
        .iter()
        .filter(|id| !kept.contains(*id))
        .copied()
        .collect();

    changes
}

/// Categories without an id get one derived from their name. Nameless ones are dropped.
pub fn plan_category_changes(existing: &[String], incoming: &[CategoryInput]) -> CategoryChanges {
    let mut seen = HashSet::new();
    let mut connect = Vec::with_capacity(incoming.len());

    for category in incoming {
        let name = category.name.trim();
        let id = match category.id.trim() {
            "" => Category::slug_for(name),
            id => id.to_string(),
        };
        if id.is_empty() || !seen.insert(id.clone()) {
            continue;
        }

        connect.push(CategoryInput {
            name: if name.is_empty() { id.clone() } else { name.to_string() },
            id,
        });
    }

    let disconnect = existing
        .iter()
        .filter(|id| !seen.contains(*id))
        .cloned()
        .collect();

    CategoryChanges {
        connect,
        disconnect,
    }
}

#[allow(clippy::cast_possible_wrap)]
fn position(index: usize) -> i64 {
    index as i64
}

impl Recipe {
    #[tracing::instrument(skip(pool, input), fields(recipe.name = %input.name), err)]
    pub async fn create_with_details(
        pool: &SqlitePool,
        author_user_id: Uuid,
        input: RecipeInput,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(
            "
            INSERT INTO recipes (
                recipe_id, author_user_id, name, search_name, description, instructions,
                servings, prep_time, cook_time
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(author_user_id)
        .bind(input.name.trim())
        .bind(Recipe::search_name(&input.name))
        .bind(input.description.as_deref().unwrap_or_default())
        .bind(input.instructions.as_deref().unwrap_or_default())
        .bind(input.servings)
        .bind(input.prep_time)
        .bind(input.cook_time)
        .fetch_one(&mut *tx)
        .await?;

        apply_details(&mut *tx, recipe.recipe_id, &input).await?;

        tx.commit().await?;

        tracing::info!(recipe.id = %recipe.recipe_id, "Created recipe");

        Ok(recipe)
    }

    /// Returns `None` when there is no recipe with this id.
    #[tracing::instrument(skip(pool, input), err)]
    pub async fn update_with_details(
        pool: &SqlitePool,
        recipe_id: Uuid,
        input: RecipeInput,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(
            "
            UPDATE recipes
            SET name = ?,
                search_name = ?,
                description = COALESCE(?, description),
                instructions = COALESCE(?, instructions),
                servings = ?,
                prep_time = ?,
                cook_time = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE recipe_id = ?
            RETURNING *
            ",
        )
        .bind(input.name.trim())
        .bind(Recipe::search_name(&input.name))
        .bind(input.description.as_deref())
        .bind(input.instructions.as_deref())
        .bind(input.servings)
        .bind(input.prep_time)
        .bind(input.cook_time)
        .bind(recipe_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(recipe) = recipe else {
            return Ok(None);
        };

        apply_details(&mut *tx, recipe_id, &input).await?;

        tx.commit().await?;

        Ok(Some(recipe))
    }
}

async fn apply_details(
    conn: &mut SqliteConnection,
    recipe_id: Uuid,
    input: &RecipeInput,
) -> Result<()> {
    if let Some(ingredients) = &input.ingredients {
        sync_ingredients(conn, recipe_id, ingredients).await?;
    }
    if let Some(steps) = &input.steps {
        sync_steps(conn, recipe_id, steps).await?;
    }
    if let Some(categories) = &input.categories {
        sync_categories(conn, recipe_id, categories).await?;
    }

    Ok(())
}

async fn sync_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: Uuid,
    ingredients: &[IngredientInput],
) -> Result<()> {
    let mut resolved = Vec::with_capacity(ingredients.len());
    for input in ingredients.iter().filter(|i| !i.name.trim().is_empty()) {
        let ingredient = Ingredient::get_or_create(&mut *conn, &input.name).await?;
        resolved.push((ingredient.ingredient_id, input));
    }

    let existing = RecipeIngredient::ingredient_ids_for(&mut *conn, recipe_id).await?;
    let changes = plan_ingredient_changes(&existing, &resolved);

    for ingredient_id in changes.delete {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ? AND ingredient_id = ?")
            .bind(recipe_id)
            .bind(ingredient_id)
            .execute(&mut *conn)
            .await?;
    }

    for upsert in changes.upsert {
        sqlx::query(
            "
            INSERT INTO recipe_ingredients (
                recipe_id, ingredient_id, name, quantity, unit, display_order
            )
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (recipe_id, ingredient_id) DO UPDATE
            SET name = excluded.name,
                quantity = excluded.quantity,
                unit = excluded.unit,
                display_order = excluded.display_order,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(recipe_id)
        .bind(upsert.ingredient_id)
        .bind(upsert.name)
        .bind(upsert.quantity)
        .bind(upsert.unit)
        .bind(upsert.display_order)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn sync_steps(
    conn: &mut SqliteConnection,
    recipe_id: Uuid,
    steps: &[StepInput],
) -> Result<()> {
    let existing = RecipeStep::step_ids_for(&mut *conn, recipe_id).await?;
    let changes = plan_step_changes(&existing, steps);

    for step_id in changes.delete {
        RecipeStep::delete(&mut *conn, step_id).await?;
    }
    for update in changes.update {
        RecipeStep::update(&mut *conn, update.step_id, update.step_number, &update.content).await?;
    }
    for insert in changes.insert {
        RecipeStep::insert(&mut *conn, recipe_id, insert.step_number, &insert.content).await?;
    }

    Ok(())
}

async fn sync_categories(
    conn: &mut SqliteConnection,
    recipe_id: Uuid,
    categories: &[CategoryInput],
) -> Result<()> {
    let existing = RecipeCategory::category_ids_for(&mut *conn, recipe_id).await?;
    let changes = plan_category_changes(&existing, categories);

    for category_id in changes.disconnect {
        RecipeCategory::disconnect(&mut *conn, recipe_id, &category_id).await?;
    }
    for category in changes.connect {
        Category::connect_or_create(&mut *conn, &category.id, &category.name).await?;
        RecipeCategory::connect(&mut *conn, recipe_id, &category.id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::User;

    fn ingredient(name: &str, quantity: Option<f64>, unit: Option<&str>) -> IngredientInput {
        IngredientInput {
            ingredient_id: None,
            name: name.to_string(),
            quantity,
            unit: unit.map(ToString::to_string),
        }
    }

    fn step(step_id: Option<Uuid>, content: &str) -> StepInput {
        StepInput {
            step_id,
            content: content.to_string(),
        }
    }

    fn category(id: &str, name: &str) -> CategoryInput {
        CategoryInput {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn ingredient_plan_deletes_missing_and_upserts_in_order() {
        let flour = Uuid::new_v4();
        let sugar = Uuid::new_v4();
        let salt = Uuid::new_v4();
        let flour_input = ingredient(" Flour ", Some(2.0), Some("cups"));
        let salt_input = ingredient("salt", None, Some(" "));

        let changes =
            plan_ingredient_changes(&[flour, sugar], &[(salt, &salt_input), (flour, &flour_input)]);

        assert_eq!(changes.delete, vec![sugar]);
        assert_eq!(
            changes.upsert,
            vec![
                IngredientUpsert {
                    ingredient_id: salt,
                    name: "salt".to_string(),
                    quantity: None,
                    unit: None,
                    display_order: 0,
                },
                IngredientUpsert {
                    ingredient_id: flour,
                    name: "Flour".to_string(),
                    quantity: Some(2.0),
                    unit: Some("cups".to_string()),
                    display_order: 1,
                },
            ]
        );
    }

    #[test]
    fn ingredient_plan_keeps_the_first_duplicate() {
        let butter = Uuid::new_v4();
        let first = ingredient("Butter", Some(1.0), None);
        let second = ingredient("butter", Some(9.0), None);

        let changes = plan_ingredient_changes(&[], &[(butter, &first), (butter, &second)]);

        assert_eq!(changes.upsert.len(), 1);
        assert_eq!(changes.upsert[0].quantity, Some(1.0));
    }

    #[test]
    fn empty_ingredient_list_deletes_everything() {
        let flour = Uuid::new_v4();

        let changes = plan_ingredient_changes(&[flour], &[]);

        assert_eq!(changes.delete, vec![flour]);
        assert!(changes.upsert.is_empty());
    }

    #[test]
    fn step_plan_updates_owned_and_inserts_the_rest() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let foreign = Uuid::new_v4();

        let changes = plan_step_changes(
            &[first, second],
            &[
                step(None, "Preheat the oven"),
                step(Some(second), "Mix"),
                step(Some(foreign), "Bake"),
            ],
        );

        assert_eq!(changes.delete, vec![first]);
        assert_eq!(
            changes.update,
            vec![StepUpdate {
                step_id: second,
                step_number: 2,
                content: "Mix".to_string(),
            }]
        );
        assert_eq!(
            changes.insert,
            vec![
                StepInsert {
                    step_number: 1,
                    content: "Preheat the oven".to_string(),
                },
                StepInsert {
                    step_number: 3,
                    content: "Bake".to_string(),
                },
            ]
        );
    }

    #[test]
    fn step_id_repeated_only_updates_once() {
        let only = Uuid::new_v4();

        let changes = plan_step_changes(&[only], &[step(Some(only), "a"), step(Some(only), "b")]);

        assert!(changes.delete.is_empty());
        assert_eq!(changes.update.len(), 1);
        assert_eq!(changes.insert.len(), 1);
        assert_eq!(changes.insert[0].step_number, 2);
    }

    #[test]
    fn category_plan_slugs_missing_ids_and_disconnects_the_rest() {
        let changes = plan_category_changes(
            &["dessert".to_string(), "quick".to_string()],
            &[
                category("quick", "Quick"),
                category("", "Weeknight Dinners"),
                category("", "  "),
                category("quick", "Speedy"),
            ],
        );

        assert_eq!(
            changes.connect,
            vec![
                category("quick", "Quick"),
                category("weeknight-dinners", "Weeknight Dinners"),
            ]
        );
        assert_eq!(changes.disconnect, vec!["dessert".to_string()]);
    }

    async fn author(pool: &SqlitePool) -> Uuid {
        User::create(pool, "julia", "souffle").await.unwrap().user_id
    }

    fn full_input() -> RecipeInput {
        RecipeInput {
            name: "Pancakes".to_string(),
            description: Some("Fluffy".to_string()),
            instructions: None,
            servings: Some(4),
            prep_time: Some(10),
            cook_time: Some(15),
            ingredients: Some(vec![
                ingredient("Flour", Some(1.5), Some("cups")),
                ingredient("Milk", Some(1.25), Some("cups")),
                ingredient("Egg", Some(1.0), None),
            ]),
            steps: Some(vec![step(None, "Whisk"), step(None, "Fry")]),
            categories: Some(vec![category("breakfast", "Breakfast")]),
        }
    }

    #[sqlx::test]
    async fn create_persists_everything_with_no_favorites(pool: SqlitePool) {
        let author = author(&pool).await;

        let recipe = Recipe::create_with_details(&pool, author, full_input())
            .await
            .unwrap();
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.instructions, "");
        assert_eq!(recipe.author_user_id, Some(author));

        let full = Recipe::get_full(&pool, recipe.recipe_id, Some(author))
            .await
            .unwrap()
            .unwrap();

        let ingredients: Vec<_> = full.ingredients.iter().map(RecipeIngredient::display).collect();
        assert_eq!(
            ingredients,
            vec!["Flour (1 1/2 cups)", "Milk (1 1/4 cups)", "Egg (1)"]
        );
        let steps: Vec<_> = full
            .steps
            .iter()
            .map(|s| (s.step_number, s.content.as_str()))
            .collect();
        assert_eq!(steps, vec![(1, "Whisk"), (2, "Fry")]);
        assert_eq!(full.categories.len(), 1);
        assert_eq!(full.categories[0].category_id, "breakfast");
        assert_eq!(full.favorite_count, 0);
        assert!(!full.is_favorited);
    }

    #[sqlx::test]
    async fn shared_ingredients_reuse_the_catalogue_entry(pool: SqlitePool) {
        let author = author(&pool).await;

        let first = Recipe::create_with_details(&pool, author, full_input())
            .await
            .unwrap();
        let second = Recipe::create_with_details(
            &pool,
            author,
            RecipeInput {
                ingredients: Some(vec![ingredient("FLOUR", Some(3.0), Some("cups"))]),
                ..RecipeInput::named("Bread")
            },
        )
        .await
        .unwrap();

        let first = RecipeIngredient::get_by_recipe(&pool, first.recipe_id).await.unwrap();
        let second = RecipeIngredient::get_by_recipe(&pool, second.recipe_id).await.unwrap();
        assert_eq!(first[0].ingredient_id, second[0].ingredient_id);
        assert_eq!(second[0].name, "FLOUR");
    }

    #[sqlx::test]
    async fn update_reconciles_ingredients_steps_and_categories(pool: SqlitePool) {
        let author = author(&pool).await;
        let recipe = Recipe::create_with_details(&pool, author, full_input())
            .await
            .unwrap();
        let before = Recipe::get_full(&pool, recipe.recipe_id, None)
            .await
            .unwrap()
            .unwrap();
        let fry = before.steps[1].step_id;

        let updated = Recipe::update_with_details(
            &pool,
            recipe.recipe_id,
            RecipeInput {
                name: "Buttermilk Pancakes".to_string(),
                description: None,
                instructions: Some("Serve hot".to_string()),
                servings: Some(6),
                prep_time: None,
                cook_time: Some(20),
                ingredients: Some(vec![
                    ingredient("egg", Some(2.0), None),
                    ingredient("Flour", Some(2.0), Some("cups")),
                    ingredient("Buttermilk", Some(1.5), Some("cups")),
                ]),
                steps: Some(vec![step(Some(fry), "Fry in butter"), step(None, "Stack")]),
                categories: Some(vec![category("", "Weekend Brunch")]),
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.name, "Buttermilk Pancakes");
        assert_eq!(updated.description, "Fluffy");
        assert_eq!(updated.instructions, "Serve hot");
        assert_eq!(updated.prep_time, None);
        assert_eq!(updated.servings, Some(6));

        let after = Recipe::get_full(&pool, recipe.recipe_id, None)
            .await
            .unwrap()
            .unwrap();

        let ingredients: Vec<_> = after.ingredients.iter().map(RecipeIngredient::display).collect();
        assert_eq!(
            ingredients,
            vec!["Egg (2)", "Flour (2 cups)", "Buttermilk (1 1/2 cups)"]
        );

        assert_eq!(after.steps.len(), 2);
        assert_eq!(after.steps[0].step_id, fry);
        assert_eq!(after.steps[0].step_number, 1);
        assert_eq!(after.steps[0].content, "Fry in butter");
        assert_eq!(after.steps[1].content, "Stack");

        let categories: Vec<_> = after.categories.iter().map(|c| c.category_id.as_str()).collect();
        assert_eq!(categories, vec!["weekend-brunch"]);
    }

    #[sqlx::test]
    async fn absent_lists_are_untouched_and_empty_lists_clear(pool: SqlitePool) {
        let author = author(&pool).await;
        let recipe = Recipe::create_with_details(&pool, author, full_input())
            .await
            .unwrap();

        Recipe::update_with_details(&pool, recipe.recipe_id, RecipeInput::named("Pancakes"))
            .await
            .unwrap()
            .unwrap();
        let untouched = Recipe::get_full(&pool, recipe.recipe_id, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.ingredients.len(), 3);
        assert_eq!(untouched.steps.len(), 2);
        assert_eq!(untouched.categories.len(), 1);

        Recipe::update_with_details(
            &pool,
            recipe.recipe_id,
            RecipeInput {
                ingredients: Some(vec![]),
                steps: Some(vec![]),
                categories: Some(vec![]),
                ..RecipeInput::named("Pancakes")
            },
        )
        .await
        .unwrap()
        .unwrap();
        let cleared = Recipe::get_full(&pool, recipe.recipe_id, None)
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.ingredients.is_empty());
        assert!(cleared.steps.is_empty());
        assert!(cleared.categories.is_empty());
    }

    #[sqlx::test]
    async fn updating_a_missing_recipe_returns_none(pool: SqlitePool) {
        let updated = Recipe::update_with_details(&pool, Uuid::new_v4(), RecipeInput::named("Ghost"))
            .await
            .unwrap();

        assert!(updated.is_none());
        assert_eq!(Recipe::count(&pool).await.unwrap(), 0);
    }
}
