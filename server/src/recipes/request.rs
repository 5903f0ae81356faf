use std::collections::HashSet;

use db::cooking::{CategoryInput, IngredientInput, RecipeInput, StepInput};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrors};

/// Body of `POST /api/recipes` and `PUT /api/recipes/{id}`.
///
/// Leaving out `ingredients`, `steps` or `categories` keeps what is stored.
/// Sending an empty list clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecipeRequest {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub servings: Option<i64>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub ingredients: Option<Vec<IngredientInput>>,
    pub steps: Option<Vec<StepInput>>,
    pub categories: Option<Vec<CategoryInput>>,
}

impl RecipeRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::NameRequired);
        }

        let mut seen = HashSet::new();
        for (index, ingredient) in self.ingredients.iter().flatten().enumerate() {
            let name = ingredient.name.trim();
            if name.is_empty() {
                errors.push(ValidationError::IngredientNameRequired(index + 1));
            } else if !seen.insert(name.to_lowercase()) {
                errors.push(ValidationError::DuplicateIngredient(name.to_string()));
            }
        }

        for (index, step) in self.steps.iter().flatten().enumerate() {
            if step.content.trim().is_empty() {
                errors.push(ValidationError::EmptyStep(index + 1));
            }
        }

        for (field, value) in [
            ("Servings", self.servings),
            ("Prep time", self.prep_time),
            ("Cook time", self.cook_time),
        ] {
            if value.is_some_and(|v| v < 0) {
                errors.push(ValidationError::Negative(field));
            }
        }

        ValidationErrors::check(errors)
    }
}

impl From<RecipeRequest> for RecipeInput {
    fn from(request: RecipeRequest) -> Self {
        RecipeInput {
            name: request.name,
            description: request.description,
            instructions: request.instructions,
            servings: request.servings,
            prep_time: request.prep_time,
            cook_time: request.cook_time,
            ingredients: request.ingredients,
            steps: request.steps,
            categories: request.categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(name: &str) -> IngredientInput {
        IngredientInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn step(content: &str) -> StepInput {
        StepInput {
            step_id: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn a_named_recipe_is_valid() {
        let request = RecipeRequest {
            name: "Toast".to_string(),
            ..Default::default()
        };

        assert!(request.validate().is_ok());
    }

    #[test]
    fn reports_every_problem_at_once() {
        let request = RecipeRequest {
            name: "   ".to_string(),
            servings: Some(-1),
            cook_time: Some(0),
            ingredients: Some(vec![ingredient("Flour"), ingredient(" "), ingredient("FLOUR")]),
            steps: Some(vec![step("Mix"), step("")]),
            ..Default::default()
        };

        let errors = request.validate().unwrap_err();

        assert_eq!(
            errors.0,
            vec![
                ValidationError::NameRequired,
                ValidationError::IngredientNameRequired(2),
                ValidationError::DuplicateIngredient("FLOUR".to_string()),
                ValidationError::EmptyStep(2),
                ValidationError::Negative("Servings"),
            ]
        );
    }

    #[test]
    fn missing_lists_deserialize_as_absent() {
        let request: RecipeRequest =
            serde_json::from_str(r#"{"name": "Toast", "steps": []}"#).unwrap();

        assert_eq!(request.ingredients, None);
        assert_eq!(request.steps, Some(vec![]));
        assert_eq!(request.categories, None);

        let input = RecipeInput::from(request);
        assert_eq!(input.name, "Toast");
        assert_eq!(input.steps, Some(vec![]));
    }
}
