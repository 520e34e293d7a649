use crate::constants::{INVALID_KEY_MESSAGE, MISSING_AUTH_MESSAGE};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use claiss_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Clone, Debug)]
pub struct AuthState {
    /// `None` lets every request through.
    pub api_secret_key: Option<String>,
}

impl AuthState {
    pub fn new(api_secret_key: Option<String>) -> Self {
        if api_secret_key.is_none() {
            tracing::warn!("API_SECRET_KEY not set, API authentication is disabled");
        }
        Self { api_secret_key }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_secret_key.is_some()
    }
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized(message: &str) -> Response {
    HttpAppError(AppError::Unauthorized(message.to_string())).into_response()
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ref expected) = auth_state.api_secret_key else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        tracing::debug!(path = %request.uri().path(), "Missing bearer token");
        return unauthorized(MISSING_AUTH_MESSAGE);
    };

    if !secure_compare(token, expected) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
        return unauthorized(INVALID_KEY_MESSAGE);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare("s3cret", "s3cret"));
        assert!(!secure_compare("s3cret", "s3creT"));
        assert!(!secure_compare("s3cret", "s3cret-longer"));
        assert!(!secure_compare("", "s3cret"));
    }
}
