//! Static bearer-token authentication.
//!
//! Every protected route compares `Authorization: Bearer <token>` against a
//! single configured secret. The check runs before any extraction or
//! validation in the handler.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Shared secret accepted as the bearer token.
#[derive(Clone)]
pub struct BearerSecret(std::sync::Arc<String>);

impl BearerSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(std::sync::Arc::new(secret.into()))
    }
}

pub async fn require_bearer(
    State(secret): State<BearerSecret>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => {
            return Err(AppError::AuthError(anyhow::anyhow!(
                "Missing or invalid Authorization header"
            )));
        }
    };

    // Constant-time comparison; ct_eq yields false on length mismatch.
    let matches: bool = token.as_bytes().ct_eq(secret.0.as_bytes()).into();
    if !matches {
        return Err(AppError::AuthError(anyhow::anyhow!("Invalid API key")));
    }

    Ok(next.run(req).await)
}
