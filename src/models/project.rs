// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project and membership models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Accepted values for `projectType`. The empty string clears the type.
pub const PROJECT_TYPES: &[&str] = &[
    "",
    "Garden",
    "Farm",
    "Reforestation",
    "Orchard/Grove",
    "Permaculture",
];

/// Role a user holds within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Owner,
    Member,
}

/// A garden, farm or other site that groups pins.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Free-form place description (address, region)
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub area: Option<f64>,
    pub area_unit: Option<String>,
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub metadata: Option<Json<serde_json::Value>>,
    pub is_public: bool,
    pub is_active: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of active pins, computed at read time
    pub pins_count: i64,
    /// Active members, owner first
    #[sqlx(skip)]
    pub members: Vec<ProjectMember>,
}

/// Membership row joining a user to a project.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMembership {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: ProjectRole,
    pub permissions: Option<Json<serde_json::Value>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member summary embedded in project responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Project name must be between 3 and 100 characters"
    ))]
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    pub area_unit: Option<String>,
    #[validate(custom(function = "validate_project_type"))]
    pub project_type: Option<String>,
    pub status: Option<String>,
    /// `YYYY-MM-DD` or RFC3339
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    /// Users added as `member` alongside the owner
    pub member_ids: Option<Vec<Uuid>>,
}

/// Partial update for a project. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Project name must be between 3 and 100 characters"
    ))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    pub area_unit: Option<String>,
    #[validate(custom(function = "validate_project_type"))]
    pub project_type: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub is_public: Option<bool>,
    pub is_active: Option<bool>,
}

impl CreateProjectInput {
    /// Strip surrounding whitespace before validation.
    pub fn trimmed(mut self) -> Self {
        self.name = super::trimmed(self.name);
        self
    }
}

impl UpdateProjectInput {
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.map(super::trimmed);
        self
    }
}

fn validate_project_type(value: &str) -> Result<(), ValidationError> {
    if PROJECT_TYPES.contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("project_type");
        err.message = Some(
            "Project type must be one of: Garden, Farm, Reforestation, Orchard/Grove, Permaculture"
                .into(),
        );
        Err(err)
    }
}
