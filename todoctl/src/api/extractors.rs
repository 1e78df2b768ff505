//! Extractors that validate input before a handler runs.
//!
//! axum's own extractors answer malformed input with a variety of 4xx codes.
//! These wrappers funnel every rejection, and every failed
//! [`validator::Validate`] check, into [`Error::Validation`] so clients always
//! see a 422 with a `detail` message. The one exception is a body cut off by
//! the size limit, which stays a 413.

use axum::extract::{FromRequest, FromRequestParts, Json, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::Error;

/// Query string deserialized into `T` and validated.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::Validation {
                message: rejection.body_text(),
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// JSON body deserialized into `T` and validated.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                Error::PayloadTooLarge
            } else {
                Error::Validation {
                    message: rejection.body_text(),
                }
            }
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters whose parse failures are reported as validation errors.
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::Validation {
                message: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}
