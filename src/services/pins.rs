// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin store: project-scoped pins with visibility rules and viewport search.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqliteConnection;
use uuid::Uuid;
use validator::Validate;

use crate::db::pins::BoundsScope;
use crate::db::{self, Database};
use crate::error::{AppError, Result};
use crate::models::pin::{pin_in_rect, DEFAULT_PIN_STATUS, DEFAULT_PIN_TYPE};
use crate::models::{Coordinates, CreatePinInput, MapBounds, Pin, UpdatePinInput};
use crate::services::projects::has_access;

#[derive(Clone)]
pub struct PinService {
    db: Database,
}

impl PinService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Every active pin the user can see: pins in their projects plus public
    /// pins, newest first.
    pub async fn list_all_for_user(&self, user_id: Uuid) -> Result<Vec<Pin>> {
        let mut conn = self.db.acquire().await?;
        let pins = db::pins::list_visible(&mut conn, user_id).await?;
        tracing::debug!(user_id = %user_id, count = pins.len(), "Listed pins");
        Ok(pins)
    }

    /// Visible pins inside a map viewport (edges inclusive).
    ///
    /// With a `project_id` the search is restricted to that project and
    /// requires membership.
    pub async fn list_in_bounds(&self, bounds: &MapBounds, user_id: Uuid) -> Result<Vec<Pin>> {
        let rect = bounds.to_rect()?;
        let mut conn = self.db.acquire().await?;

        let scope = match bounds.project_id {
            Some(project_id) => {
                require_project_member(&mut conn, project_id, user_id).await?;
                BoundsScope::Project(project_id)
            }
            None => BoundsScope::VisibleTo(user_id),
        };

        let candidates = db::pins::list_in_rect(&mut conn, &rect, scope).await?;
        let candidate_count = candidates.len();
        let pins: Vec<Pin> = candidates
            .into_iter()
            .filter(|pin| pin_in_rect(&rect, pin))
            .collect();

        tracing::debug!(
            user_id = %user_id,
            candidates = candidate_count,
            count = pins.len(),
            "Bounds query"
        );
        Ok(pins)
    }

    /// Fetch one pin. Private pins require project membership.
    pub async fn get_by_id(&self, pin_id: Uuid, user_id: Uuid) -> Result<Pin> {
        let mut conn = self.db.acquire().await?;
        let pin = find_pin(&mut conn, pin_id).await?;

        if !pin_visible(&mut conn, &pin, user_id).await? {
            tracing::warn!(pin_id = %pin_id, user_id = %user_id, "Pin access denied");
            return Err(AppError::Forbidden(format!(
                "No access to pin {}",
                pin_id
            )));
        }
        Ok(pin)
    }

    pub async fn list_by_project(&self, project_id: Uuid, user_id: Uuid) -> Result<Vec<Pin>> {
        let mut conn = self.db.acquire().await?;
        require_project_member(&mut conn, project_id, user_id).await?;
        Ok(db::pins::list_by_project(&mut conn, project_id).await?)
    }

    /// True if the pin is active and either public or in one of the user's
    /// projects.
    pub async fn check_access(&self, pin_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        match db::pins::find_active(&mut conn, pin_id).await? {
            Some(pin) => pin_visible(&mut conn, &pin, user_id).await,
            None => Ok(false),
        }
    }

    pub async fn create(&self, input: CreatePinInput, user_id: Uuid) -> Result<Pin> {
        let input = input.trimmed();
        input.validate()?;
        let coords = Coordinates::new(input.latitude, input.longitude)?;

        let now = Utc::now();
        let pin = Pin {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            location: Json(coords.to_geometry()),
            latitude: coords.latitude,
            longitude: coords.longitude,
            pin_type: input
                .pin_type
                .unwrap_or_else(|| DEFAULT_PIN_TYPE.to_string()),
            status: input
                .status
                .unwrap_or_else(|| DEFAULT_PIN_STATUS.to_string()),
            metadata: input.metadata.map(Json),
            is_public: input.is_public.unwrap_or(false),
            is_active: true,
            project_id: input.project_id,
            created_by_id: user_id,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        require_project_member(&mut tx, pin.project_id, user_id).await?;
        db::pins::insert(&mut tx, &pin).await?;
        tx.commit().await?;

        tracing::info!(
            pin_id = %pin.id,
            project_id = %pin.project_id,
            latitude = pin.latitude,
            longitude = pin.longitude,
            "Created pin"
        );
        Ok(pin)
    }

    /// Apply a partial update. Coordinates move `location` and the
    /// latitude/longitude columns together.
    pub async fn update(&self, pin_id: Uuid, patch: UpdatePinInput, user_id: Uuid) -> Result<Pin> {
        let patch = patch.trimmed();
        patch.validate()?;
        let coords = patch.coordinates()?;

        let mut tx = self.db.begin().await?;
        let mut pin = find_pin(&mut tx, pin_id).await?;
        require_project_member(&mut tx, pin.project_id, user_id).await?;

        if let Some(name) = patch.name {
            pin.name = name;
        }
        if let Some(description) = patch.description {
            pin.description = Some(description);
        }
        if let Some(coords) = coords {
            pin.location = Json(coords.to_geometry());
            pin.latitude = coords.latitude;
            pin.longitude = coords.longitude;
        }
        if let Some(pin_type) = patch.pin_type {
            pin.pin_type = pin_type;
        }
        if let Some(status) = patch.status {
            pin.status = status;
        }
        if let Some(metadata) = patch.metadata {
            pin.metadata = Some(Json(metadata));
        }
        if let Some(is_public) = patch.is_public {
            pin.is_public = is_public;
        }
        pin.updated_at = Utc::now();

        db::pins::update(&mut tx, &pin).await?;
        tx.commit().await?;

        tracing::info!(pin_id = %pin_id, user_id = %user_id, "Updated pin");
        Ok(pin)
    }

    /// Soft delete: the row stays but disappears from every query.
    pub async fn delete(&self, pin_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.db.begin().await?;
        let pin = find_pin(&mut tx, pin_id).await?;
        require_project_member(&mut tx, pin.project_id, user_id).await?;
        db::pins::soft_delete(&mut tx, pin_id, Utc::now()).await?;
        tx.commit().await?;

        tracing::info!(pin_id = %pin_id, user_id = %user_id, "Deleted pin");
        Ok(())
    }
}

async fn find_pin(conn: &mut SqliteConnection, pin_id: Uuid) -> Result<Pin> {
    db::pins::find_active(conn, pin_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pin {}", pin_id)))
}

/// Public pins are visible to everyone, private ones to project members.
async fn pin_visible(conn: &mut SqliteConnection, pin: &Pin, user_id: Uuid) -> Result<bool> {
    if pin.is_public {
        return Ok(true);
    }
    has_access(conn, pin.project_id, user_id).await
}

/// `Forbidden` unless the user is an active member of the project.
async fn require_project_member(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<()> {
    if has_access(conn, project_id, user_id).await? {
        return Ok(());
    }
    tracing::warn!(project_id = %project_id, user_id = %user_id, "Pin project access denied");
    Err(AppError::Forbidden(format!(
        "Not a member of project {}",
        project_id
    )))
}
