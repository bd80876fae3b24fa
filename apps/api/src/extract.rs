//! JSON extractor that answers malformed bodies with the error envelope.

use axum::Json;
use axum::extract::{FromRequest, Request};
use rolegrid_core::AppError;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Like [`axum::Json`], but deserialization failures become a
/// `VALIDATION_ERROR` envelope instead of axum's plain-text rejection.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(AppError::Validation(rejection.body_text()))),
        }
    }
}
