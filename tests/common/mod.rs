// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use plant_tracker::config::Config;
use plant_tracker::db::Database;
use plant_tracker::models::{CreatePinInput, CreateProjectInput, Pin, Project, User};
use plant_tracker::routes::create_router;
use plant_tracker::services::ExternalIdentity;
use plant_tracker::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use uuid::Uuid;

/// Create a fresh in-memory database with the schema applied.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::new_in_memory()
        .await
        .expect("Failed to create in-memory database")
}

/// Create a test app on a private in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db().await;
    let state = Arc::new(AppState::new(config, db));

    (create_router(state.clone()), state)
}

/// App state on a WAL-mode database file inside `dir`, pooled across
/// several connections so concurrent requests really overlap.
#[allow(dead_code)]
pub async fn create_file_backed_state(dir: &std::path::Path) -> Arc<AppState> {
    let url = format!("sqlite://{}", dir.join("plant_tracker.db").display());
    let db = Database::connect(&url, 5)
        .await
        .expect("Failed to open file-backed database");
    Arc::new(AppState::new(Config::test_default(), db))
}

/// Create a test JWT token with the claims the auth middleware reads.
#[allow(dead_code)]
pub fn create_test_jwt(subject: &str, email: Option<&str>, signing_key: &[u8]) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let mut claims = json!({
        "sub": subject,
        "exp": now + 86400,
        "iat": now,
        "user_metadata": { "name": format!("User {}", subject) },
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Token for `subject` signed with the test key.
#[allow(dead_code)]
pub fn token_for(state: &AppState, subject: &str) -> String {
    create_test_jwt(
        subject,
        Some(&format!("{}@example.com", subject)),
        &state.config.jwt_signing_key,
    )
}

/// Resolve (creating on first call) the local user for `subject`.
#[allow(dead_code)]
pub async fn create_user(state: &AppState, subject: &str) -> User {
    let email = format!("{}@example.com", subject);
    let name = format!("User {}", subject);
    state
        .identity_service
        .resolve_user(&ExternalIdentity::new(subject, &email, Some(&name)))
        .await
        .expect("Failed to resolve user")
}

/// Create a project owned by `owner` with extra members.
#[allow(dead_code)]
pub async fn create_project(state: &AppState, owner: &User, members: &[&User]) -> Project {
    let input = CreateProjectInput {
        name: "Community Garden".to_string(),
        member_ids: Some(members.iter().map(|m| m.id).collect()),
        ..Default::default()
    };
    state
        .project_service
        .create_project(input, owner.id)
        .await
        .expect("Failed to create project")
}

/// Create a pin at the given position.
#[allow(dead_code)]
pub async fn create_pin(
    state: &AppState,
    project_id: Uuid,
    user: &User,
    latitude: f64,
    longitude: f64,
    is_public: bool,
) -> Pin {
    let input = CreatePinInput {
        name: "Fig tree".to_string(),
        latitude: Some(latitude),
        longitude: Some(longitude),
        is_public: Some(is_public),
        project_id,
        ..Default::default()
    };
    state
        .pin_service
        .create(input, user.id)
        .await
        .expect("Failed to create pin")
}

/// Send a request through the router and decode the JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
