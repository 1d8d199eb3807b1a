//! Request extractors that fail with [`StoreError`] so every rejection
//! renders as the usual `{"message": ...}` body.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use crate::auth::{AdminGrant, Principal};
use crate::StoreError;

/// JSON request body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(StoreError))]
pub struct Payload<T>(pub T);

/// Path parameters.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(StoreError))]
pub struct PathParam<T>(pub T);

/// Query string.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(StoreError))]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StoreError::Unauthorized("missing bearer token".to_string()))?;

        let claims = state.tokens.verify(token)?;
        Ok(Principal::from(&claims))
    }
}

/// An authenticated administrator.
pub struct Admin(pub AdminGrant);

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        Ok(Admin(principal.admin()?))
    }
}
