use crate::types::AppError;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

/// Raw bearer token from the `Authorization` header.
///
/// Rejects with `AppError::Auth` (401) when the header is missing or is not
/// a bearer credential.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Auth("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Expected a bearer token".to_string()))?;

        Ok(BearerToken(token.to_string()))
    }
}
