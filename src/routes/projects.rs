// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project and membership routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CreateProjectInput, Pin, Project, UpdateProjectInput};
use crate::routes::DeleteResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/members", post(add_member))
        .route(
            "/api/projects/{id}/members/{member_id}",
            delete(remove_member),
        )
        .route("/api/projects/{id}/pins", get(list_project_pins))
}

// ─── Projects ────────────────────────────────────────────────

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Project>>> {
    let projects = state.project_service.list_my_projects(user.user_id).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>> {
    let project = state.project_service.get_project(id, user.user_id).await?;
    Ok(Json(project))
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateProjectInput>,
) -> Result<Json<Project>> {
    let project = state
        .project_service
        .create_project(input, user.user_id)
        .await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateProjectInput>,
) -> Result<Json<Project>> {
    let project = state
        .project_service
        .update_project(id, patch, user.user_id)
        .await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.project_service.delete_project(id, user.user_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

// ─── Members ─────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberRequest {
    member_id: Uuid,
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<Project>> {
    let project = state
        .project_service
        .add_member(id, body.member_id, user.user_id)
        .await?;
    Ok(Json(project))
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Project>> {
    let project = state
        .project_service
        .remove_member(id, member_id, user.user_id)
        .await?;
    Ok(Json(project))
}

// ─── Pins ────────────────────────────────────────────────────

async fn list_project_pins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Pin>>> {
    let pins = state.pin_service.list_by_project(id, user.user_id).await?;
    Ok(Json(pins))
}
