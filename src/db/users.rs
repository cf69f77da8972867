// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User queries.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::models::User;

const USER_COLUMNS: &str = "id, external_id, email, name, created_at, updated_at";

pub async fn find_by_id(conn: &mut SqliteConnection, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE external_id = ?"
    ))
    .bind(external_id)
    .fetch_optional(conn)
    .await
}

pub async fn find_by_email(conn: &mut SqliteConnection, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(conn)
        .await
}

pub async fn insert(conn: &mut SqliteConnection, user: &User) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO users (id, external_id, email, name, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.external_id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrite the identity fields of an existing user.
pub async fn update_identity(
    conn: &mut SqliteConnection,
    id: Uuid,
    external_id: &str,
    email: &str,
    name: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE users SET external_id = ?, email = ?, name = ?, updated_at = ? WHERE id = ?",
    )
    .bind(external_id)
    .bind(email)
    .bind(name)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Subset of `ids` that name existing users.
pub async fn existing_ids(conn: &mut SqliteConnection, ids: &[Uuid]) -> sqlx::Result<Vec<Uuid>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM users WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    query.build_query_scalar::<Uuid>().fetch_all(conn).await
}
