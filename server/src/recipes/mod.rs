pub mod form;
pub mod request;

pub use form::RecipeForm;
pub use request::RecipeRequest;
