// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project and membership queries.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{Project, ProjectMember, ProjectMembership, ProjectRole};

const PROJECT_COLUMNS: &str = "p.id, p.name, p.description, p.location, p.latitude, \
     p.longitude, p.area, p.area_unit, p.project_type, p.status, p.start_date, p.end_date, \
     p.metadata, p.is_public, p.is_active, p.owner_id, p.created_at, p.updated_at, \
     (SELECT COUNT(*) FROM pins WHERE pins.project_id = p.id AND pins.is_active = 1) \
     AS pins_count";

const MEMBERSHIP_COLUMNS: &str =
    "id, project_id, user_id, role, permissions, is_active, created_at, updated_at";

// ─── Projects ───────────────────────────────────────────────────────────────

pub async fn find_by_id(conn: &mut SqliteConnection, id: Uuid) -> sqlx::Result<Option<Project>> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Projects where `user_id` holds an active membership, newest first.
pub async fn list_for_member(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> sqlx::Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p \
         JOIN project_users pu ON pu.project_id = p.id \
         WHERE pu.user_id = ? AND pu.is_active = 1 \
         ORDER BY p.created_at DESC, p.rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await
}

pub async fn insert(conn: &mut SqliteConnection, project: &Project) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO projects (id, name, description, location, latitude, longitude, area, \
         area_unit, project_type, status, start_date, end_date, metadata, is_public, is_active, \
         owner_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project.id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(&project.location)
    .bind(project.latitude)
    .bind(project.longitude)
    .bind(project.area)
    .bind(&project.area_unit)
    .bind(&project.project_type)
    .bind(&project.status)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(&project.metadata)
    .bind(project.is_public)
    .bind(project.is_active)
    .bind(project.owner_id)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Write back every mutable column of `project`.
pub async fn update(conn: &mut SqliteConnection, project: &Project) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE projects SET name = ?, description = ?, location = ?, latitude = ?, \
         longitude = ?, area = ?, area_unit = ?, project_type = ?, status = ?, start_date = ?, \
         end_date = ?, metadata = ?, is_public = ?, is_active = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&project.name)
    .bind(&project.description)
    .bind(&project.location)
    .bind(project.latitude)
    .bind(project.longitude)
    .bind(project.area)
    .bind(&project.area_unit)
    .bind(&project.project_type)
    .bind(&project.status)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(&project.metadata)
    .bind(project.is_public)
    .bind(project.is_active)
    .bind(project.updated_at)
    .bind(project.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Hard delete. Memberships, pins and reminders go with it by cascade.
pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

// ─── Memberships ────────────────────────────────────────────────────────────

/// Active members of a project, owner first, then by join time.
pub async fn list_members(
    conn: &mut SqliteConnection,
    project_id: Uuid,
) -> sqlx::Result<Vec<ProjectMember>> {
    sqlx::query_as::<_, ProjectMember>(
        "SELECT u.id AS user_id, u.name, u.email, pu.role, pu.created_at AS joined_at \
         FROM project_users pu JOIN users u ON u.id = pu.user_id \
         WHERE pu.project_id = ? AND pu.is_active = 1 \
         ORDER BY CASE pu.role WHEN 'owner' THEN 0 ELSE 1 END, pu.created_at, pu.rowid",
    )
    .bind(project_id)
    .fetch_all(conn)
    .await
}

/// Membership row for the pair, active or not.
pub async fn find_membership(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<ProjectMembership>> {
    sqlx::query_as::<_, ProjectMembership>(&format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM project_users WHERE project_id = ? AND user_id = ?"
    ))
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Role of `user_id` in `project_id` if the membership is active.
pub async fn active_role(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> sqlx::Result<Option<ProjectRole>> {
    sqlx::query_scalar::<_, ProjectRole>(
        "SELECT role FROM project_users WHERE project_id = ? AND user_id = ? AND is_active = 1",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn insert_membership(
    conn: &mut SqliteConnection,
    membership: &ProjectMembership,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO project_users (id, project_id, user_id, role, permissions, is_active, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(membership.id)
    .bind(membership.project_id)
    .bind(membership.user_id)
    .bind(membership.role)
    .bind(&membership.permissions)
    .bind(membership.is_active)
    .bind(membership.created_at)
    .bind(membership.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_membership_state(
    conn: &mut SqliteConnection,
    membership_id: Uuid,
    role: ProjectRole,
    is_active: bool,
    now: DateTime<Utc>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE project_users SET role = ?, is_active = ?, updated_at = ? WHERE id = ?")
        .bind(role)
        .bind(is_active)
        .bind(now)
        .bind(membership_id)
        .execute(conn)
        .await?;
    Ok(())
}
