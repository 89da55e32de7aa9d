//! Access Control Middleware.
//! Authenticates with HTTP Basic credentials, then applies the rule table.
//! Requests decided by an anonymous rule skip authentication.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::warn;

use crate::http::error::ApiError;
use crate::security::credentials::{AuthenticationError, CredentialResolver, Principal};
use crate::security::policy::{AuthorizationPolicy, Decision, DenyReason};

/// State required for access control.
#[derive(Clone)]
pub struct AccessControlState {
    pub policy: Arc<AuthorizationPolicy>,
    pub credentials: Arc<dyn CredentialResolver>,
    pub realm: Arc<str>,
}

/// Extract `(username, password)` from an `Authorization: Basic` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), AuthenticationError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthenticationError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthenticationError::MalformedHeader)?;

    let (scheme, encoded) = value
        .split_once(' ')
        .ok_or(AuthenticationError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthenticationError::MalformedHeader);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthenticationError::MalformedHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthenticationError::MalformedHeader)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthenticationError::MalformedHeader)?;

    Ok((username.to_string(), password.to_string()))
}

pub async fn access_control_middleware(
    State(state): State<AccessControlState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if state.policy.admits_anonymous(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    // 1. Authenticate. Failure short-circuits rule evaluation.
    let principal = match authenticate(&state, basic_credentials(req.headers())).await {
        Ok(p) => p,
        Err(e) => {
            warn!(path = %req.uri().path(), error = %e, "Authentication failed");
            return ApiError::Unauthenticated {
                realm: state.realm.to_string(),
                message: e.to_string(),
            }
            .into_response();
        }
    };

    // 2. Authorize against the rule table.
    match state
        .policy
        .evaluate(req.method(), req.uri().path(), principal.roles())
    {
        Decision::Allow { .. } => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Decision::Deny(reason) => {
            let matched = match reason {
                DenyReason::InsufficientRole { rule } => state.policy.rules().get(rule),
                DenyReason::NoMatchingRule => None,
            };
            warn!(
                user = %principal.username(),
                method = %req.method(),
                path = %req.uri().path(),
                rule = matched.map(|r| r.pattern().as_str()),
                required = ?matched.map(|r| r.roles()),
                ?reason,
                "Access denied"
            );
            let message = match reason {
                DenyReason::NoMatchingRule => "no rule grants access to this resource",
                DenyReason::InsufficientRole { .. } => "insufficient role for this resource",
            };
            ApiError::Forbidden(message.to_string()).into_response()
        }
    }
}

async fn authenticate(
    state: &AccessControlState,
    credentials: Result<(String, String), AuthenticationError>,
) -> Result<Principal, AuthenticationError> {
    let (username, password) = credentials?;
    state.credentials.authenticate(&username, &password).await
}
