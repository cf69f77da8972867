// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task routes called by the external scheduler, not by users.
//!
//! Protected by the scheduler token middleware in routes/mod.rs.

use crate::error::Result;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/sweep-overdue", post(sweep_overdue))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResponse {
    pub updated: u64,
}

/// Mark every active reminder due before today as overdue.
///
/// Errors surface as 500 so the scheduler retries.
async fn sweep_overdue(State(state): State<Arc<AppState>>) -> Result<Json<SweepResponse>> {
    let updated = state.reminder_service.sweep_overdue().await?;
    Ok(Json(SweepResponse { updated }))
}
