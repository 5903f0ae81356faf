use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use color_eyre::eyre::eyre;

use super::ServerError;

/// `Json` that rejects with the same `{"message": ...}` body as every other error.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServerError(eyre!(rejection.body_text()), rejection.status()))?;

        Ok(Self(value))
    }
}
