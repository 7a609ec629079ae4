//! Axum extractor and middleware for bearer-token authentication

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prefkit_security::Principal;

use crate::{errors::AuthError, traits::TokenValidator};

/// Extractor for the authenticated [`Principal`]; requires [`authenticate`]
/// to have run for the route.
#[derive(Debug, Clone)]
pub struct Authz(pub Principal);

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authz)
            .ok_or_else(|| {
                AuthError::Internal("Principal not found - auth middleware not configured".to_owned())
            })
    }
}

#[derive(Clone)]
pub struct AuthState {
    validator: Arc<dyn TokenValidator>,
    public_paths: Arc<[String]>,
}

impl AuthState {
    pub fn new(validator: Arc<dyn TokenValidator>, public_paths: Vec<String>) -> Self {
        Self {
            validator,
            public_paths: public_paths.into(),
        }
    }

    fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }
}

/// Authentication middleware
///
/// 1. CORS preflight and public paths pass through without a principal.
/// 2. Otherwise a bearer token is required; it is resolved through the
///    [`TokenValidator`] and the resulting [`Principal`] is inserted into the
///    request extensions.
///
/// Missing or rejected tokens produce 401. Authorization is left to the
/// handlers.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_preflight_request(request.method(), request.headers())
        || state.is_public(request.uri().path())
    {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        return AuthError::Unauthenticated.into_response();
    };

    let principal = match state.validator.validate(token).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    tracing::debug!(user = %principal.username(), "Request authenticated");
    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}
