//! Token-based authentication module.
//!
//! Resolves API tokens to author identities with constant-time comparison to
//! mitigate timing attacks. Requests without credentials proceed anonymously;
//! handlers decide whether an identity is required.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::models::Identity;

/// Header name for the API token.
pub const API_TOKEN_HEADER: &str = "x-api-token";

/// Caller identity attached to every request by the auth layer.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Option<Identity>,
}

impl AuthContext {
    /// The identity, or an unauthorized error for anonymous callers.
    pub fn require_identity(&self) -> Result<&Identity, AppError> {
        self.identity
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Configured token -> identity mapping.
pub struct TokenMap {
    entries: Vec<(String, Identity)>,
}

impl TokenMap {
    pub fn new(entries: Vec<(String, Identity)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a provided token, comparing against every entry in constant time.
    pub fn resolve(&self, provided: &str) -> Option<&Identity> {
        let mut matched = None;
        for (token, identity) in &self.entries {
            if constant_time_compare(provided, token) {
                matched = Some(identity);
            }
        }
        matched
    }
}

/// Auth layer: attaches an [`AuthContext`] to the request.
///
/// A missing token yields an anonymous context; a token that resolves to no
/// identity is rejected outright.
pub async fn identity_layer(tokens: Arc<TokenMap>, mut request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| {
            request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string())
        });

    let identity = match provided {
        Some(token) => match tokens.resolve(&token) {
            Some(identity) => Some(identity.clone()),
            None => {
                return AppError::Unauthorized("Invalid API token".to_string()).into_response();
            }
        },
        None => None,
    };

    request.extensions_mut().insert(AuthContext { identity });
    next.run(request).await
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(username: &str) -> Identity {
        Identity {
            id: format!("id-{}", username),
            username: username.to_string(),
        }
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_token_map_resolve() {
        let map = TokenMap::new(vec![
            ("tok-a".to_string(), identity("alice")),
            ("tok-b".to_string(), identity("bob")),
        ]);

        assert_eq!(map.resolve("tok-b").unwrap().username, "bob");
        assert!(map.resolve("tok-c").is_none());
        assert!(map.resolve("").is_none());
    }

    #[test]
    fn test_require_identity() {
        let anonymous = AuthContext { identity: None };
        assert!(anonymous.require_identity().is_err());

        let authed = AuthContext {
            identity: Some(identity("alice")),
        };
        assert_eq!(authed.require_identity().unwrap().username, "alice");
    }
}
