// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::services::ExternalIdentity;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Profile data carried in the token.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity provider user id)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: usize,
}

/// Authenticated caller, resolved to a local user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Middleware that requires a valid bearer token and resolves the caller.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_jwt(token, &state.config.jwt_signing_key)?;
    let email = claims.email.as_deref().ok_or_else(|| {
        tracing::warn!(subject = %claims.sub, "Token has no email claim");
        AppError::InvalidToken
    })?;
    let name = claims
        .user_metadata
        .as_ref()
        .and_then(|m| m.name.as_deref());

    let identity = ExternalIdentity::new(&claims.sub, email, name);
    let user = state.identity_service.resolve_user(&identity).await?;

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        email: user.email,
        name: user.name,
    });

    Ok(next.run(request).await)
}

/// Decode and validate an HS256 token.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    fn token(name: Option<&str>, exp_offset: i64, key: &[u8]) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "sub-123".to_string(),
            email: Some("gardener@example.com".to_string()),
            user_metadata: Some(UserMetadata {
                name: name.map(str::to_string),
            }),
            iat: now as usize,
            exp: (now + exp_offset) as usize,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_reads_claims() {
        let claims = verify_jwt(&token(Some("Gardener"), 3600, KEY), KEY).unwrap();
        assert_eq!(claims.sub, "sub-123");
        assert_eq!(claims.email.as_deref(), Some("gardener@example.com"));
        assert_eq!(
            claims.user_metadata.and_then(|m| m.name).as_deref(),
            Some("Gardener")
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        assert!(matches!(
            verify_jwt(&token(None, 3600, KEY), b"another_key_of_sufficient_length"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        assert!(matches!(
            verify_jwt(&token(None, -3600, KEY), KEY),
            Err(AppError::InvalidToken)
        ));
    }
}
