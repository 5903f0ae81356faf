pub mod categories;
pub mod ingredients;
pub mod recipe;
pub mod steps;
pub mod upsert;

pub use categories::{Category, RecipeCategory};
pub use ingredients::{format_fraction, Ingredient, IngredientSummary, RecipeIngredient};
pub use recipe::{Recipe, RecipeSearch, RecipeSummary, RecipeWithDetails};
pub use steps::RecipeStep;
pub use upsert::{
    plan_category_changes, plan_ingredient_changes, plan_step_changes, CategoryChanges,
    CategoryInput, IngredientChanges, IngredientInput, IngredientUpsert, RecipeInput, StepChanges,
    StepInput, StepInsert, StepUpdate,
};
