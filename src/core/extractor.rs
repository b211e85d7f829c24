use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::core::error::AppError;
use crate::shared::constants::{MAX_OWNER_ID_LENGTH, OWNER_ID_HEADER};
use crate::shared::validation::OWNER_ID_REGEX;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Identity of the party whose customizations are being read or edited.
///
/// The owner is established by the gateway in front of this service and
/// forwarded in the `X-Owner-Id` header; only its shape is checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing owner identity".to_string()))?;

        let owner_id = raw
            .to_str()
            .map_err(|_| AppError::BadRequest("Owner identity must be ASCII".to_string()))?
            .trim();

        if owner_id.len() > MAX_OWNER_ID_LENGTH {
            return Err(AppError::BadRequest(format!(
                "Owner identity must be at most {} characters",
                MAX_OWNER_ID_LENGTH
            )));
        }

        if !OWNER_ID_REGEX.is_match(owner_id) {
            return Err(AppError::BadRequest(format!(
                "Malformed owner identity '{}'",
                owner_id
            )));
        }

        Ok(Owner(owner_id.to_string()))
    }
}
