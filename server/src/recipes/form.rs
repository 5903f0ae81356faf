//! The recipe editor's working copy.
//!
//! A [`RecipeForm`] is filled from a stored recipe (or left blank for a new
//! one), edited through explicit transitions, and finally turned into the
//! [`RecipeRequest`] the API accepts. Ingredients are edited one at a time in
//! a popover: changes to the open ingredient can be confirmed or thrown away.

use db::cooking::{CategoryInput, IngredientInput, RecipeWithDetails, StepInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::RecipeRequest;
use crate::validation::{ValidationError, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientFormModel {
    pub ingredient_id: Option<Uuid>,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFormModel {
    pub step_id: Option<Uuid>,
    pub content: String,
    pub order: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeForm {
    pub recipe_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub servings: Option<i64>,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub categories: Vec<CategoryInput>,
    pub ingredients: Vec<IngredientFormModel>,
    pub steps: Vec<StepFormModel>,
    #[serde(skip)]
    editing: Option<EditSession>,
}

/// Which ingredient the popover is showing, and how to undo it.
#[derive(Debug, Clone, PartialEq)]
enum EditSession {
    Creating { index: usize },
    Editing { index: usize, snapshot: IngredientFormModel },
}

impl EditSession {
    fn index(&self) -> usize {
        match self {
            Self::Creating { index } | Self::Editing { index, .. } => *index,
        }
    }

    fn index_mut(&mut self) -> &mut usize {
        match self {
            Self::Creating { index } | Self::Editing { index, .. } => index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("Another ingredient is already being edited")]
    AlreadyOpen,
    #[error("No ingredient is being edited")]
    NotOpen,
    #[error("There is no ingredient at position {0}")]
    OutOfRange(usize),
    #[error("Ingredient needs a name")]
    BlankName,
}

impl RecipeForm {
    /// Blank for a new recipe, otherwise a copy of what is stored.
    pub fn from_recipe(recipe: Option<&RecipeWithDetails>) -> Self {
        let Some(details) = recipe else {
            return Self::default();
        };

        Self {
            recipe_id: Some(details.recipe.recipe_id),
            name: details.recipe.name.clone(),
            description: details.recipe.description.clone(),
            instructions: details.recipe.instructions.clone(),
            servings: details.recipe.servings,
            prep_time: details.recipe.prep_time,
            cook_time: details.recipe.cook_time,
            categories: details
                .categories
                .iter()
                .map(|category| CategoryInput {
                    id: category.category_id.clone(),
                    name: category.name.clone(),
                })
                .collect(),
            ingredients: details
                .ingredients
                .iter()
                .map(|ingredient| IngredientFormModel {
                    ingredient_id: Some(ingredient.ingredient_id),
                    name: ingredient.name.clone(),
                    quantity: ingredient.quantity,
                    unit: ingredient.unit.clone(),
                })
                .collect(),
            steps: details
                .steps
                .iter()
                .enumerate()
                .map(|(order, step)| StepFormModel {
                    step_id: Some(step.step_id),
                    content: step.content.clone(),
                    order,
                })
                .collect(),
            editing: None,
        }
    }

    pub fn is_creating(&self) -> bool {
        self.recipe_id.is_none()
    }

    pub fn ingredient_editor(&mut self) -> IngredientEditor<'_> {
        IngredientEditor {
            ingredients: &mut self.ingredients,
            session: &mut self.editing,
        }
    }

    pub fn add_step(&mut self) -> usize {
        let order = self.steps.len();
        self.steps.push(StepFormModel {
            step_id: None,
            content: String::new(),
            order,
        });

        order
    }

    pub fn remove_step(&mut self, index: usize) -> Result<StepFormModel, EditorError> {
        if index >= self.steps.len() {
            return Err(EditorError::OutOfRange(index));
        }

        let removed = self.steps.remove(index);
        for (order, step) in self.steps.iter_mut().enumerate() {
            step.order = order;
        }

        Ok(removed)
    }

    pub fn step_errors(&self) -> Vec<ValidationError> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.content.trim().is_empty())
            .map(|(index, _)| ValidationError::EmptyStep(index + 1))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.editing.is_some() {
            errors.push(ValidationError::EditorOpen);
        }
        if self.name.trim().is_empty() {
            errors.push(ValidationError::NameRequired);
        }
        errors.extend(self.step_errors());

        ValidationErrors::check(errors)
    }

    /// The request this form submits. Every list is sent, so removing the
    /// last ingredient clears them on the server.
    pub fn into_request(self) -> RecipeRequest {
        let mut steps = self.steps;
        steps.sort_by_key(|step| step.order);

        RecipeRequest {
            name: self.name.trim().to_string(),
            description: Some(self.description),
            instructions: Some(self.instructions),
            servings: self.servings,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            ingredients: Some(
                self.ingredients
                    .into_iter()
                    .map(|ingredient| IngredientInput {
                        ingredient_id: ingredient.ingredient_id,
                        name: ingredient.name.trim().to_string(),
                        quantity: ingredient.quantity,
                        unit: ingredient.unit,
                    })
                    .collect(),
            ),
            steps: Some(
                steps
                    .into_iter()
                    .map(|step| StepInput {
                        step_id: step.step_id,
                        content: step.content,
                    })
                    .collect(),
            ),
            categories: Some(self.categories),
        }
    }

    /// Validates, then converts.
    pub fn submit(self) -> Result<RecipeRequest, ValidationErrors> {
        self.validate()?;

        Ok(self.into_request())
    }
}

/// Draft/cancel editing over a form's ingredient list.
pub struct IngredientEditor<'a> {
    ingredients: &'a mut Vec<IngredientFormModel>,
    session: &'a mut Option<EditSession>,
}

impl IngredientEditor<'_> {
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn open_index(&self) -> Option<usize> {
        self.session.as_ref().map(EditSession::index)
    }

    /// Appends a blank ingredient and opens it. Cancelling removes it again.
    pub fn add(&mut self) -> Result<usize, EditorError> {
        if self.is_open() {
            return Err(EditorError::AlreadyOpen);
        }

        self.ingredients.push(IngredientFormModel::default());
        let index = self.ingredients.len() - 1;
        *self.session = Some(EditSession::Creating { index });

        Ok(index)
    }

    /// Opens an existing ingredient. Cancelling restores it as it is now.
    pub fn edit(&mut self, index: usize) -> Result<(), EditorError> {
        if self.is_open() {
            return Err(EditorError::AlreadyOpen);
        }
        let snapshot = self
            .ingredients
            .get(index)
            .cloned()
            .ok_or(EditorError::OutOfRange(index))?;

        *self.session = Some(EditSession::Editing { index, snapshot });

        Ok(())
    }

    pub fn update(&mut self, f: impl FnOnce(&mut IngredientFormModel)) -> Result<(), EditorError> {
        let index = self.open_index().ok_or(EditorError::NotOpen)?;
        let ingredient = self
            .ingredients
            .get_mut(index)
            .ok_or(EditorError::OutOfRange(index))?;

        f(ingredient);

        Ok(())
    }

    /// Keeps the edits and closes. A nameless ingredient stays open.
    pub fn confirm(&mut self) -> Result<(), EditorError> {
        let index = self.open_index().ok_or(EditorError::NotOpen)?;

        if self
            .ingredients
            .get(index)
            .is_none_or(|ingredient| ingredient.name.trim().is_empty())
        {
            return Err(EditorError::BlankName);
        }

        *self.session = None;

        Ok(())
    }

    /// Throws the edits away and closes.
    pub fn cancel(&mut self) -> Result<(), EditorError> {
        let session = self.session.take().ok_or(EditorError::NotOpen)?;

        match session {
            EditSession::Creating { index } => {
                if index < self.ingredients.len() {
                    self.ingredients.remove(index);
                }
            }
            EditSession::Editing { index, snapshot } => {
                if let Some(ingredient) = self.ingredients.get_mut(index) {
                    *ingredient = snapshot;
                }
            }
        }

        Ok(())
    }

    /// Deletes an ingredient. Removing the open one closes the popover.
    pub fn remove(&mut self, index: usize) -> Result<IngredientFormModel, EditorError> {
        if index >= self.ingredients.len() {
            return Err(EditorError::OutOfRange(index));
        }

        match self.open_index() {
            Some(open) if open == index => *self.session = None,
            Some(open) if open > index => {
                if let Some(session) = self.session.as_mut() {
                    *session.index_mut() -= 1;
                }
            }
            _ => {}
        }

        Ok(self.ingredients.remove(index))
    }
}
