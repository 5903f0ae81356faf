use std::fmt::{self, Display};

use serde::Serialize;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Ingredient {0} needs a name")]
    IngredientNameRequired(usize),
    #[error("Ingredient \"{0}\" is listed more than once")]
    DuplicateIngredient(String),
    #[error("Step {0} cannot be empty")]
    EmptyStep(usize),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("Finish editing the open ingredient first")]
    EditorOpen,
    #[error("Username is required")]
    UsernameRequired,
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
}

/// Every problem found with a submission, reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn check(errors: Vec<ValidationError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid request: {}", self.messages().join(", "))
    }
}

impl Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_when_empty() {
        assert!(ValidationErrors::check(vec![]).is_ok());
    }

    #[test]
    fn messages_are_human_readable() {
        let errors = ValidationErrors::check(vec![
            ValidationError::NameRequired,
            ValidationError::EmptyStep(2),
            ValidationError::PasswordTooShort,
        ])
        .unwrap_err();

        assert_eq!(
            errors.messages(),
            vec![
                "Name is required",
                "Step 2 cannot be empty",
                "Password must be at least 6 characters",
            ]
        );
        assert_eq!(
            errors.to_string(),
            "Invalid request: Name is required, Step 2 cannot be empty, Password must be at least 6 characters"
        );
    }
}
