// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler authentication middleware for `/tasks/*` routes.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the shared scheduler token.
pub const TASKS_TOKEN_HEADER: &str = "x-tasks-token";

/// Require the configured scheduler token. With no token configured every
/// request is rejected.
pub async fn require_tasks_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.tasks_token.as_deref() else {
        tracing::warn!("Blocked tasks request: TASKS_TOKEN is not configured");
        return Err(StatusCode::FORBIDDEN);
    };

    let presented = request
        .headers()
        .get(TASKS_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok());

    match presented {
        Some(token) if tokens_match(token, expected) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Blocked tasks request with invalid token");
            Err(StatusCode::FORBIDDEN)
        }
        None => {
            tracing::warn!("Blocked tasks request without token header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
