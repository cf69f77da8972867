// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CreateReminderInput, Reminder, UpdateReminderInput};
use crate::routes::DeleteResponse;
use crate::services::CompletedReminder;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reminders", post(create_reminder))
        .route("/api/reminders/active", get(list_active))
        .route("/api/reminders/overdue", get(list_overdue))
        .route(
            "/api/reminders/{id}",
            put(update_reminder).delete(delete_reminder),
        )
        .route("/api/reminders/{id}/complete", post(complete_reminder))
        .route("/api/reminders/{id}/dismiss", post(dismiss_reminder))
}

// ─── Lists ───────────────────────────────────────────────────

async fn list_active(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Reminder>>> {
    let reminders = state
        .reminder_service
        .list_active_for_user(user.user_id)
        .await?;
    Ok(Json(reminders))
}

async fn list_overdue(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Reminder>>> {
    let reminders = state
        .reminder_service
        .list_overdue_for_user(user.user_id)
        .await?;
    Ok(Json(reminders))
}

// ─── Mutations ───────────────────────────────────────────────

async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateReminderInput>,
) -> Result<Json<Reminder>> {
    let reminder = state.reminder_service.create(input, user.user_id).await?;
    Ok(Json(reminder))
}

async fn update_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateReminderInput>,
) -> Result<Json<Reminder>> {
    let reminder = state
        .reminder_service
        .update(id, patch, user.user_id)
        .await?;
    Ok(Json(reminder))
}

async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.reminder_service.delete(id, user.user_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// Complete a reminder; recurring reminders also return their successor.
async fn complete_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompletedReminder>> {
    let completed = state
        .reminder_service
        .mark_completed(id, user.user_id)
        .await?;
    Ok(Json(completed))
}

async fn dismiss_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reminder>> {
    let reminder = state.reminder_service.dismiss(id, user.user_id).await?;
    Ok(Json(reminder))
}
