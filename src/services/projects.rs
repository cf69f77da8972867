// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project access model.
//!
//! Owns projects and their memberships and answers the authorization
//! questions every other service asks: is this user an active member of the
//! project, and is that membership the owner's.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::SqliteConnection;
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, Database};
use crate::error::{AppError, Result};
use crate::models::{
    CreateProjectInput, Project, ProjectMembership, ProjectRole, UpdateProjectInput,
};
use crate::time_utils;

#[derive(Clone)]
pub struct ProjectService {
    db: Database,
}

impl ProjectService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Projects the user is an active member of, newest first.
    pub async fn list_my_projects(&self, user_id: Uuid) -> Result<Vec<Project>> {
        let mut conn = self.db.acquire().await?;
        let mut projects = db::projects::list_for_member(&mut conn, user_id).await?;
        for project in &mut projects {
            project.members = db::projects::list_members(&mut conn, project.id).await?;
        }

        tracing::debug!(user_id = %user_id, count = projects.len(), "Listed projects");
        Ok(projects)
    }

    /// Fetch a project the user belongs to.
    ///
    /// Non-members get `NotFound` so project ids do not leak.
    pub async fn get_project(&self, project_id: Uuid, user_id: Uuid) -> Result<Project> {
        let mut conn = self.db.acquire().await?;
        require_member(&mut conn, project_id, user_id).await?;
        load_project(&mut conn, project_id).await
    }

    /// True if the user holds an active membership in the project.
    pub async fn check_access(&self, project_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        has_access(&mut conn, project_id, user_id).await
    }

    /// True if the user's active membership is the owner's.
    pub async fn check_ownership(&self, project_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        has_ownership(&mut conn, project_id, user_id).await
    }

    // ─── Mutations ──────────────────────────────────────────────────────────

    /// Create a project owned by `owner_id`, with optional extra members.
    ///
    /// The project, the owner membership and every member membership are
    /// written in one transaction. Any unknown member id aborts the whole
    /// create.
    pub async fn create_project(
        &self,
        input: CreateProjectInput,
        owner_id: Uuid,
    ) -> Result<Project> {
        let input = input.trimmed();
        input.validate()?;
        let start_date = parse_optional_date("startDate", input.start_date.as_deref())?;
        let end_date = parse_optional_date("endDate", input.end_date.as_deref())?;
        check_date_order(start_date, end_date)?;

        let mut seen = HashSet::new();
        let member_ids: Vec<Uuid> = input
            .member_ids
            .unwrap_or_default()
            .into_iter()
            .filter(|id| *id != owner_id && seen.insert(*id))
            .collect();

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            location: input.location,
            latitude: input.latitude,
            longitude: input.longitude,
            area: input.area,
            area_unit: input.area_unit,
            project_type: input.project_type.filter(|t| !t.is_empty()),
            status: input.status,
            start_date,
            end_date,
            metadata: input.metadata.map(Json),
            is_public: input.is_public.unwrap_or(false),
            is_active: true,
            owner_id,
            created_at: now,
            updated_at: now,
            pins_count: 0,
            members: Vec::new(),
        };

        let mut tx = self.db.begin().await?;

        let known: HashSet<Uuid> = db::users::existing_ids(&mut tx, &member_ids)
            .await?
            .into_iter()
            .collect();
        if let Some(unknown) = member_ids.iter().find(|id| !known.contains(id)) {
            return Err(AppError::Validation(format!(
                "Unknown member id: {}",
                unknown
            )));
        }

        db::projects::insert(&mut tx, &project).await?;
        db::projects::insert_membership(
            &mut tx,
            &new_membership(project.id, owner_id, ProjectRole::Owner),
        )
        .await?;
        for member_id in &member_ids {
            db::projects::insert_membership(
                &mut tx,
                &new_membership(project.id, *member_id, ProjectRole::Member),
            )
            .await?;
        }

        let created = load_project(&mut tx, project.id).await?;
        tx.commit().await?;

        tracing::info!(
            project_id = %created.id,
            owner_id = %owner_id,
            members = member_ids.len(),
            "Created project"
        );
        Ok(created)
    }

    /// Apply a partial update. Owner only.
    pub async fn update_project(
        &self,
        project_id: Uuid,
        patch: UpdateProjectInput,
        user_id: Uuid,
    ) -> Result<Project> {
        let patch = patch.trimmed();
        patch.validate()?;

        let mut tx = self.db.begin().await?;
        require_owner(&mut tx, project_id, user_id, "update").await?;

        let mut project = load_project(&mut tx, project_id).await?;

        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = Some(description);
        }
        if let Some(location) = patch.location {
            project.location = Some(location);
        }
        if let Some(latitude) = patch.latitude {
            project.latitude = Some(latitude);
        }
        if let Some(longitude) = patch.longitude {
            project.longitude = Some(longitude);
        }
        if let Some(area) = patch.area {
            project.area = Some(area);
        }
        if let Some(area_unit) = patch.area_unit {
            project.area_unit = Some(area_unit);
        }
        if let Some(project_type) = patch.project_type {
            project.project_type = Some(project_type).filter(|t| !t.is_empty());
        }
        if let Some(status) = patch.status {
            project.status = Some(status);
        }
        if let Some(raw) = patch.start_date.as_deref() {
            project.start_date = parse_optional_date("startDate", Some(raw))?;
        }
        if let Some(raw) = patch.end_date.as_deref() {
            project.end_date = parse_optional_date("endDate", Some(raw))?;
        }
        check_date_order(project.start_date, project.end_date)?;
        if let Some(metadata) = patch.metadata {
            project.metadata = Some(Json(metadata));
        }
        if let Some(is_public) = patch.is_public {
            project.is_public = is_public;
        }
        if let Some(is_active) = patch.is_active {
            project.is_active = is_active;
        }
        project.updated_at = Utc::now();

        db::projects::update(&mut tx, &project).await?;
        let updated = load_project(&mut tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project_id, user_id = %user_id, "Updated project");
        Ok(updated)
    }

    /// Delete a project and everything under it. Owner only.
    pub async fn delete_project(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.db.begin().await?;
        require_owner(&mut tx, project_id, user_id, "delete").await?;
        db::projects::delete(&mut tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project_id, user_id = %user_id, "Deleted project");
        Ok(())
    }

    /// Add `member_id` to the project as a `member`. Owner only.
    ///
    /// A previously removed member gets their old row reactivated.
    pub async fn add_member(
        &self,
        project_id: Uuid,
        member_id: Uuid,
        user_id: Uuid,
    ) -> Result<Project> {
        let mut tx = self.db.begin().await?;
        require_owner(&mut tx, project_id, user_id, "add members to").await?;

        if db::users::find_by_id(&mut tx, member_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {}", member_id)));
        }

        match db::projects::find_membership(&mut tx, project_id, member_id).await? {
            Some(existing) if existing.is_active => {
                return Err(AppError::Conflict(format!(
                    "User {} is already a member of project {}",
                    member_id, project_id
                )));
            }
            Some(existing) => {
                db::projects::set_membership_state(
                    &mut tx,
                    existing.id,
                    ProjectRole::Member,
                    true,
                    Utc::now(),
                )
                .await?;
            }
            None => {
                db::projects::insert_membership(
                    &mut tx,
                    &new_membership(project_id, member_id, ProjectRole::Member),
                )
                .await?;
            }
        }

        let project = load_project(&mut tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project_id, member_id = %member_id, "Added project member");
        Ok(project)
    }

    /// Deactivate a member's membership. Owner only; the owner cannot be
    /// removed.
    pub async fn remove_member(
        &self,
        project_id: Uuid,
        member_id: Uuid,
        user_id: Uuid,
    ) -> Result<Project> {
        let mut tx = self.db.begin().await?;
        require_owner(&mut tx, project_id, user_id, "remove members from").await?;

        let membership = db::projects::find_membership(&mut tx, project_id, member_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "User {} is not a member of project {}",
                    member_id, project_id
                ))
            })?;

        if membership.role == ProjectRole::Owner {
            return Err(AppError::Forbidden(
                "The project owner cannot be removed".to_string(),
            ));
        }

        db::projects::set_membership_state(
            &mut tx,
            membership.id,
            membership.role,
            false,
            Utc::now(),
        )
        .await?;

        let project = load_project(&mut tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(project_id = %project_id, member_id = %member_id, "Removed project member");
        Ok(project)
    }
}

// ─── Authorization helpers ──────────────────────────────────────────────────
//
// The connection-level checks below back `check_access`/`check_ownership`
// and are shared with the pin and reminder services, which run them inside
// their own transactions.

/// Role of the user's active membership in the project, if any.
pub(crate) async fn member_role(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ProjectRole>> {
    Ok(db::projects::active_role(conn, project_id, user_id).await?)
}

pub(crate) async fn has_access(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool> {
    Ok(member_role(conn, project_id, user_id).await?.is_some())
}

pub(crate) async fn has_ownership(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool> {
    Ok(member_role(conn, project_id, user_id).await? == Some(ProjectRole::Owner))
}

/// Active role of the user, or `NotFound` if there is none.
async fn require_member(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectRole> {
    member_role(conn, project_id, user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(project_id = %project_id, user_id = %user_id, "Project access denied");
            AppError::NotFound(format!("Project {}", project_id))
        })
}

/// `NotFound` without an active membership, `Forbidden` unless owner.
async fn require_owner(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    user_id: Uuid,
    action: &str,
) -> Result<()> {
    match require_member(conn, project_id, user_id).await? {
        ProjectRole::Owner => Ok(()),
        ProjectRole::Member => {
            tracing::warn!(project_id = %project_id, user_id = %user_id, action, "Owner required");
            Err(AppError::Forbidden(format!(
                "Only the project owner can {} this project",
                action
            )))
        }
    }
}

async fn load_project(conn: &mut SqliteConnection, project_id: Uuid) -> Result<Project> {
    let mut project = db::projects::find_by_id(conn, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?;
    project.members = db::projects::list_members(conn, project_id).await?;
    Ok(project)
}

fn new_membership(project_id: Uuid, user_id: Uuid, role: ProjectRole) -> ProjectMembership {
    let now = Utc::now();
    ProjectMembership {
        id: Uuid::new_v4(),
        project_id,
        user_id,
        role,
        permissions: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Parse an optional date field; the empty string clears it.
fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => time_utils::parse_date(value)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid {}: '{}'", field, value))),
    }
}

fn check_date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::Validation(
            "endDate must not be before startDate".to_string(),
        )),
        _ => Ok(()),
    }
}
