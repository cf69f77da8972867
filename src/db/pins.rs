// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin queries, including the R*Tree backed viewport search.

use chrono::{DateTime, Utc};
use geo::Rect;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::Pin;

const PIN_COLUMNS: &str = "p.id, p.name, p.description, p.location, p.latitude, p.longitude, \
     p.pin_type, p.status, p.metadata, p.is_public, p.is_active, p.project_id, \
     p.created_by_id, p.created_at, p.updated_at";

/// Membership test for the caller against the pin's project.
const MEMBER_OF_PIN_PROJECT: &str = "EXISTS (SELECT 1 FROM project_users pu \
     WHERE pu.project_id = p.project_id AND pu.user_id = ? AND pu.is_active = 1)";

/// Which pins a viewport search may return.
#[derive(Debug, Clone, Copy)]
pub enum BoundsScope {
    /// Pins of one project only.
    Project(Uuid),
    /// Public pins plus pins in any project the user belongs to.
    VisibleTo(Uuid),
}

pub async fn find_active(conn: &mut SqliteConnection, id: Uuid) -> sqlx::Result<Option<Pin>> {
    sqlx::query_as::<_, Pin>(&format!(
        "SELECT {PIN_COLUMNS} FROM pins p WHERE p.id = ? AND p.is_active = 1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Active pins that are public or belong to one of the user's projects.
pub async fn list_visible(conn: &mut SqliteConnection, user_id: Uuid) -> sqlx::Result<Vec<Pin>> {
    sqlx::query_as::<_, Pin>(&format!(
        "SELECT {PIN_COLUMNS} FROM pins p \
         WHERE p.is_active = 1 AND (p.is_public = 1 OR {MEMBER_OF_PIN_PROJECT}) \
         ORDER BY p.created_at DESC, p.rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
}

pub async fn list_by_project(
    conn: &mut SqliteConnection,
    project_id: Uuid,
) -> sqlx::Result<Vec<Pin>> {
    sqlx::query_as::<_, Pin>(&format!(
        "SELECT {PIN_COLUMNS} FROM pins p \
         WHERE p.project_id = ? AND p.is_active = 1 \
         ORDER BY p.created_at DESC, p.rowid DESC"
    ))
    .bind(project_id)
    .fetch_all(conn)
    .await
}

/// Candidate pins whose index box overlaps `rect`.
///
/// The R*Tree stores 32-bit floats rounded outward, so callers must refine
/// the result with an exact point-in-rectangle test.
pub async fn list_in_rect(
    conn: &mut SqliteConnection,
    rect: &Rect<f64>,
    scope: BoundsScope,
) -> sqlx::Result<Vec<Pin>> {
    let (scope_clause, scope_id) = match scope {
        BoundsScope::Project(project_id) => ("p.project_id = ?".to_string(), project_id),
        BoundsScope::VisibleTo(user_id) => (
            format!("(p.is_public = 1 OR {MEMBER_OF_PIN_PROJECT})"),
            user_id,
        ),
    };

    let sql = format!(
        "SELECT {PIN_COLUMNS} FROM pins p \
         JOIN pins_rtree r ON r.id = p.rowid \
         WHERE r.max_lat >= ? AND r.min_lat <= ? AND r.max_lng >= ? AND r.min_lng <= ? \
         AND p.is_active = 1 AND {scope_clause} \
         ORDER BY p.created_at DESC, p.rowid DESC"
    );

    sqlx::query_as::<_, Pin>(&sql)
        .bind(rect.min().y)
        .bind(rect.max().y)
        .bind(rect.min().x)
        .bind(rect.max().x)
        .bind(scope_id)
        .fetch_all(conn)
        .await
}

pub async fn insert(conn: &mut SqliteConnection, pin: &Pin) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO pins (id, name, description, location, latitude, longitude, pin_type, \
         status, metadata, is_public, is_active, project_id, created_by_id, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(pin.id)
    .bind(&pin.name)
    .bind(&pin.description)
    .bind(&pin.location)
    .bind(pin.latitude)
    .bind(pin.longitude)
    .bind(&pin.pin_type)
    .bind(&pin.status)
    .bind(&pin.metadata)
    .bind(pin.is_public)
    .bind(pin.is_active)
    .bind(pin.project_id)
    .bind(pin.created_by_id)
    .bind(pin.created_at)
    .bind(pin.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Write back every mutable column in one statement, so `location` and the
/// coordinate columns never disagree.
pub async fn update(conn: &mut SqliteConnection, pin: &Pin) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE pins SET name = ?, description = ?, location = ?, latitude = ?, longitude = ?, \
         pin_type = ?, status = ?, metadata = ?, is_public = ?, updated_at = ? \
         WHERE id = ? AND is_active = 1",
    )
    .bind(&pin.name)
    .bind(&pin.description)
    .bind(&pin.location)
    .bind(pin.latitude)
    .bind(pin.longitude)
    .bind(&pin.pin_type)
    .bind(&pin.status)
    .bind(&pin.metadata)
    .bind(pin.is_public)
    .bind(pin.updated_at)
    .bind(pin.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn soft_delete(
    conn: &mut SqliteConnection,
    id: Uuid,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let result =
        sqlx::query("UPDATE pins SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}
