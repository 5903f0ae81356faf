use axum::response::Response;

pub use errors::*;

pub(crate) mod current_user;
pub mod errors;
pub(crate) mod json_body;
pub(crate) mod routes;

pub(crate) mod api {
    pub mod ingredients;
    pub mod recipes;
    pub mod users;
}

pub(crate) mod auth {
    pub mod routes;
}

#[cfg(test)]
pub(crate) mod test_helpers;

pub(crate) type ResponseResult<T = Response> = Result<T, ServerError>;
