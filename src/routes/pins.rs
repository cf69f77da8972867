// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin routes, including the per-pin reminder endpoints.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CreatePinInput, MapBounds, Pin, QuickReminderPreset, Reminder, UpdatePinInput};
use crate::routes::DeleteResponse;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pins", get(list_pins).post(create_pin))
        .route("/api/pins/bounds", get(list_pins_in_bounds))
        .route(
            "/api/pins/{id}",
            get(get_pin).put(update_pin).delete(delete_pin),
        )
        .route("/api/pins/{id}/reminders", get(list_pin_reminders))
        .route("/api/pins/{id}/reminders/quick", post(create_quick_reminder))
}

async fn list_pins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Pin>>> {
    let pins = state.pin_service.list_all_for_user(user.user_id).await?;
    Ok(Json(pins))
}

/// Pins inside a map viewport.
async fn list_pins_in_bounds(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(bounds): Query<MapBounds>,
) -> Result<Json<Vec<Pin>>> {
    let pins = state
        .pin_service
        .list_in_bounds(&bounds, user.user_id)
        .await?;
    Ok(Json(pins))
}

async fn get_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pin>> {
    let pin = state.pin_service.get_by_id(id, user.user_id).await?;
    Ok(Json(pin))
}

async fn create_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreatePinInput>,
) -> Result<Json<Pin>> {
    let pin = state.pin_service.create(input, user.user_id).await?;
    Ok(Json(pin))
}

async fn update_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdatePinInput>,
) -> Result<Json<Pin>> {
    let pin = state.pin_service.update(id, patch, user.user_id).await?;
    Ok(Json(pin))
}

async fn delete_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.pin_service.delete(id, user.user_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

// ─── Reminders on a pin ──────────────────────────────────────

async fn list_pin_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Reminder>>> {
    let reminders = state
        .reminder_service
        .list_by_plant(id, user.user_id)
        .await?;
    Ok(Json(reminders))
}

#[derive(Deserialize)]
struct QuickReminderRequest {
    /// weekly, monthly, yearly or photo
    #[serde(rename = "type")]
    preset: String,
}

async fn create_quick_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<QuickReminderRequest>,
) -> Result<Json<Reminder>> {
    let preset: QuickReminderPreset = body.preset.parse()?;
    let reminder = state
        .reminder_service
        .create_quick(id, preset, user.user_id)
        .await?;
    Ok(Json(reminder))
}
