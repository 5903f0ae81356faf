use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Largest denominator `format_fraction` will try before giving up on an exact match.
const MAX_DENOMINATOR: u64 = 64;

/// Past this the whole part no longer fits in a `u64`.
#[allow(clippy::cast_precision_loss)]
const LARGEST_WHOLE: f64 = u64::MAX as f64;

/// Renders a quantity the way a cook reads it: `1.5` is `"1 1/2"`, `0.25` is `"1/4"`.
pub fn format_fraction(quantity: f64) -> String {
    if !quantity.is_finite() {
        return quantity.to_string();
    }
    if quantity == 0.0 {
        return "0".to_string();
    }

    let sign = if quantity < 0.0 { "-" } else { "" };
    let quantity = quantity.abs();

    if quantity >= LARGEST_WHOLE {
        return format!("{sign}{quantity}");
    }

    let mut whole = quantity.trunc();
    let fractional = quantity - whole;

    let (mut numerator, denominator) = closest_fraction(fractional);
    if numerator == denominator {
        whole += 1.0;
        numerator = 0;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = whole as u64;

    match (whole, numerator) {
        (0, 0) => "0".to_string(),
        (whole, 0) => format!("{sign}{whole}"),
        (0, numerator) => format!("{sign}{numerator}/{denominator}"),
        (whole, numerator) => format!("{sign}{whole} {numerator}/{denominator}"),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn closest_fraction(fractional: f64) -> (u64, u64) {
    let mut best = (0, 1);
    let mut best_error = f64::MAX;

    for denominator in 1..=MAX_DENOMINATOR {
        let numerator = (fractional * denominator as f64).round() as u64;
        let error = (fractional - numerator as f64 / denominator as f64).abs();

        if error < best_error - 1e-9 {
            best = (numerator, denominator);
            best_error = error;
        }

        if best_error < 1e-6 {
            break;
        }
    }

    best
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub ingredient_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct IngredientSummary {
    #[sqlx(rename = "ingredient_id")]
    pub id: Uuid,
    pub name: String,
}

impl Ingredient {
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Finds the catalogue entry for `name`, creating it the first time it is used.
    pub async fn get_or_create(conn: &mut SqliteConnection, name: &str) -> Result<Self> {
        let name = Self::normalize_name(name);

        sqlx::query(
            "
            INSERT INTO ingredients (ingredient_id, name)
            VALUES (?, ?)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .execute(&mut *conn)
        .await?;

        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT ingredient_id, name, created_at, updated_at
            FROM ingredients
            WHERE name = ?
            ",
        )
        .bind(&name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(ingredient)
    }

    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT ingredient_id, name, created_at, updated_at
            FROM ingredients
            WHERE name = ?
            ",
        )
        .bind(Self::normalize_name(name))
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    pub async fn search(pool: &SqlitePool, name: &str) -> Result<Vec<IngredientSummary>> {
        let ingredients = sqlx::query_as::<_, IngredientSummary>(
            r"
            SELECT ingredient_id, name
            FROM ingredients
            WHERE name LIKE ? ESCAPE '\'
            ORDER BY name
            ",
        )
        .bind(format!("%{}%", escape_like(&Self::normalize_name(name))))
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }
}

pub(crate) fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeIngredient {
    pub async fn get_by_recipe(pool: &SqlitePool, recipe_id: Uuid) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            "
            SELECT *
            FROM recipe_ingredients
            WHERE recipe_id = ?
            ORDER BY display_order, name
            ",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }

    pub(crate) async fn ingredient_ids_for(
        conn: &mut SqliteConnection,
        recipe_id: Uuid,
    ) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_as::<_, (Uuid,)>(
            "SELECT ingredient_id FROM recipe_ingredients WHERE recipe_id = ? ORDER BY display_order",
        )
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|(id,)| id)
        .collect();

        Ok(ids)
    }

    /// `"Flour (2 1/4 cups)"`, or just the name when there is no quantity.
    pub fn display(&self) -> String {
        let name = capitalize(&self.name);

        match (self.quantity, self.unit.as_deref().map(str::trim)) {
            (Some(quantity), Some(unit)) if !unit.is_empty() => {
                format!("{name} ({} {unit})", format_fraction(quantity))
            }
            (Some(quantity), _) => format!("{name} ({})", format_fraction(quantity)),
            (None, _) => name,
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
