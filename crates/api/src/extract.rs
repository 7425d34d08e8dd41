//! Request extractors whose rejections use the API error body

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use prereq_engine::EngineError;
use serde::de::DeserializeOwned;

use crate::handlers::ApiError;

/// `Json` body; malformed input is a 400 `invalid_input`
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| invalid_input(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` string; malformed input is a 400 `invalid_input`
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| invalid_input(rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn invalid_input(message: String) -> ApiError {
    ApiError(EngineError::InvalidInput(message))
}
