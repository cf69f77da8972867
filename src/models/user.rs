//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Local user record, created on first authenticated contact.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Subject claim of the external identity provider
    #[serde(skip_serializing)]
    pub external_id: Option<String>,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
