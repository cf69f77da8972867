// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity resolution: map a verified external identity to a local user.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::db::{self, Database};
use crate::error::{AppError, Result};
use crate::models::User;

/// Identity asserted by a verified bearer token.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

impl ExternalIdentity {
    pub fn new(subject: &str, email: &str, name: Option<&str>) -> Self {
        Self {
            subject: subject.to_string(),
            email: email.trim().to_lowercase(),
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// Display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Finds or creates local users for authenticated callers.
#[derive(Clone)]
pub struct IdentityService {
    db: Database,
}

impl IdentityService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find or create the user for `identity`.
    ///
    /// Lookup order is external subject, then email (linking the subject to
    /// the existing row), then insert. If a concurrent request inserts the
    /// same user first, the unique index rejects our insert and the lookup
    /// is retried once.
    pub async fn resolve_user(&self, identity: &ExternalIdentity) -> Result<User> {
        if identity.subject.is_empty() || identity.email.is_empty() {
            return Err(AppError::InvalidToken);
        }

        if let Some(user) = self.try_resolve(identity).await? {
            return Ok(user);
        }

        tracing::debug!(subject = %identity.subject, "User insert raced, re-reading");
        self.try_resolve(identity).await?.ok_or_else(|| {
            AppError::Conflict(format!(
                "Could not resolve user for subject {}",
                identity.subject
            ))
        })
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let mut conn = self.db.acquire().await?;
        db::users::find_by_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }

    /// One resolution attempt. `Ok(None)` means the insert lost a race.
    async fn try_resolve(&self, identity: &ExternalIdentity) -> Result<Option<User>> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let existing = match db::users::find_by_external_id(&mut tx, &identity.subject).await? {
            Some(user) => Some(user),
            None => db::users::find_by_email(&mut tx, &identity.email).await?,
        };

        if let Some(user) = existing {
            let user = sync_identity(&mut tx, user, identity, now).await?;
            tx.commit().await?;
            return Ok(Some(user));
        }

        let user = User {
            id: Uuid::new_v4(),
            external_id: Some(identity.subject.clone()),
            email: identity.email.clone(),
            name: identity.display_name().to_string(),
            created_at: now,
            updated_at: now,
        };

        match db::users::insert(&mut tx, &user).await {
            Ok(()) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        tracing::info!(user_id = %user.id, subject = %identity.subject, "Created user");
        Ok(Some(user))
    }
}

/// Bring a stored user in line with the token's subject, email and name.
///
/// An email already held by a different user is left unchanged.
async fn sync_identity(
    conn: &mut SqliteConnection,
    mut user: User,
    identity: &ExternalIdentity,
    now: DateTime<Utc>,
) -> Result<User> {
    let mut email = identity.email.clone();
    if email != user.email {
        if let Some(other) = db::users::find_by_email(conn, &email).await? {
            if other.id != user.id {
                tracing::warn!(
                    user_id = %user.id,
                    other_user_id = %other.id,
                    "Token email belongs to another user, keeping stored email"
                );
                email = user.email.clone();
            }
        }
    }
    let name = identity.display_name();

    let unchanged = user.external_id.as_deref() == Some(identity.subject.as_str())
        && user.email == email
        && user.name == name;
    if unchanged {
        return Ok(user);
    }

    db::users::update_identity(conn, user.id, &identity.subject, &email, name, now).await?;
    tracing::info!(user_id = %user.id, subject = %identity.subject, "Synced user identity");

    user.external_id = Some(identity.subject.clone());
    user.email = email;
    user.name = name.to_string();
    user.updated_at = now;
    Ok(user)
}
