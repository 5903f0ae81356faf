use std::fmt::{Debug, Display};

use axum::{http::StatusCode, response::IntoResponse, Json};
use color_eyre::eyre;

use crate::validation::ValidationErrors;

pub struct ServerError(pub(crate) eyre::Report, pub(crate) StatusCode);

impl ServerError {
    pub fn status(&self) -> StatusCode {
        self.1
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Status Code: {}\n", self.1))?;
        f.write_str("ServerError: \n")?;

        Debug::fmt(&self.0, f)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = self.1;

        if status.is_server_error() {
            let error: &(dyn std::error::Error + Send + Sync + 'static) = self.0.as_ref();
            sentry::capture_error(error);

            tracing::error!(error = ?self, "ServerError");

            let body = serde_json::json!({ "message": "Internal server error" });
            return (status, Json(body)).into_response();
        }

        tracing::debug!(status = %status, error = %self.0, "Request rejected");

        let body = match self.0.downcast_ref::<ValidationErrors>() {
            Some(errors) => serde_json::json!({
                "message": self.0.to_string(),
                "errors": errors.messages(),
            }),
            None => serde_json::json!({ "message": self.0.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<eyre::Report>,
{
    fn from(err: E) -> Self {
        ServerError(err.into(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError>;
}

impl<T, E> WithStatus<T> for Result<T, E>
where
    E: Into<eyre::Report>,
{
    fn with_status(self, status: StatusCode) -> Result<T, ServerError> {
        self.map_err(|e| ServerError(e.into(), status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{http_server::test_helpers::response_body_json, validation::ValidationError};

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let response = Err::<(), _>(eyre::eyre!("Recipe not found"))
            .with_status(StatusCode::NOT_FOUND)
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response_body_json(response).await;
        assert_eq!(body, serde_json::json!({ "message": "Recipe not found" }));
    }

    #[tokio::test]
    async fn validation_errors_list_each_problem() {
        let errors = ValidationErrors(vec![
            ValidationError::NameRequired,
            ValidationError::EmptyStep(1),
        ]);
        let response = Err::<(), _>(errors)
            .with_status(StatusCode::BAD_REQUEST)
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response_body_json(response).await;
        assert_eq!(
            body["errors"],
            serde_json::json!(["Name is required", "Step 1 cannot be empty"])
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response: axum::response::Response =
            ServerError::from(eyre::eyre!("database exploded")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response_body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
