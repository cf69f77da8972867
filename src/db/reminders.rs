// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder queries.
//!
//! Reads join on the parent pin so reminders of a soft-deleted pin are
//! never returned.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{Reminder, ReminderStatus};

const REMINDER_COLUMNS: &str = "r.id, r.plant_id, r.created_by_id, r.title, r.description, \
     r.due_date, r.due_time, r.notification_type, r.status, r.is_recurring, \
     r.recurring_pattern, r.created_at, r.updated_at, r.completed_at";

const ACTIVE_PIN_JOIN: &str = "JOIN pins p ON p.id = r.plant_id AND p.is_active = 1";

const DUE_ORDER: &str = "ORDER BY r.due_date ASC, r.due_time IS NULL, r.due_time ASC, \
     r.created_at ASC, r.rowid ASC";

pub async fn find_by_id(conn: &mut SqliteConnection, id: Uuid) -> sqlx::Result<Option<Reminder>> {
    sqlx::query_as::<_, Reminder>(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders r {ACTIVE_PIN_JOIN} WHERE r.id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// All reminders attached to a pin, soonest first.
pub async fn list_by_plant(
    conn: &mut SqliteConnection,
    plant_id: Uuid,
) -> sqlx::Result<Vec<Reminder>> {
    sqlx::query_as::<_, Reminder>(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders r {ACTIVE_PIN_JOIN} \
         WHERE r.plant_id = ? {DUE_ORDER}"
    ))
    .bind(plant_id)
    .fetch_all(conn)
    .await
}

/// A user's reminders in one persisted status, soonest first.
pub async fn list_for_owner_with_status(
    conn: &mut SqliteConnection,
    owner_id: Uuid,
    status: ReminderStatus,
) -> sqlx::Result<Vec<Reminder>> {
    sqlx::query_as::<_, Reminder>(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders r {ACTIVE_PIN_JOIN} \
         WHERE r.created_by_id = ? AND r.status = ? {DUE_ORDER}"
    ))
    .bind(owner_id)
    .bind(status)
    .fetch_all(conn)
    .await
}

/// A user's reminders that are overdue as of `today`: already marked, or
/// still active with a due date in the past.
pub async fn list_overdue_for_owner(
    conn: &mut SqliteConnection,
    owner_id: Uuid,
    today: NaiveDate,
) -> sqlx::Result<Vec<Reminder>> {
    sqlx::query_as::<_, Reminder>(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders r {ACTIVE_PIN_JOIN} \
         WHERE r.created_by_id = ? \
         AND (r.status = 'overdue' OR (r.status = 'active' AND r.due_date < ?)) {DUE_ORDER}"
    ))
    .bind(owner_id)
    .bind(today)
    .fetch_all(conn)
    .await
}

pub async fn insert(conn: &mut SqliteConnection, reminder: &Reminder) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO reminders (id, plant_id, created_by_id, title, description, due_date, \
         due_time, notification_type, status, is_recurring, recurring_pattern, created_at, \
         updated_at, completed_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(reminder.id)
    .bind(reminder.plant_id)
    .bind(reminder.created_by_id)
    .bind(&reminder.title)
    .bind(&reminder.description)
    .bind(reminder.due_date)
    .bind(reminder.due_time)
    .bind(reminder.notification_type)
    .bind(reminder.status)
    .bind(reminder.is_recurring)
    .bind(reminder.recurring_pattern)
    .bind(reminder.created_at)
    .bind(reminder.updated_at)
    .bind(reminder.completed_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Write back every mutable column of `reminder`.
pub async fn update(conn: &mut SqliteConnection, reminder: &Reminder) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE reminders SET title = ?, description = ?, due_date = ?, due_time = ?, \
         notification_type = ?, status = ?, is_recurring = ?, recurring_pattern = ?, \
         updated_at = ?, completed_at = ? WHERE id = ?",
    )
    .bind(&reminder.title)
    .bind(&reminder.description)
    .bind(reminder.due_date)
    .bind(reminder.due_time)
    .bind(reminder.notification_type)
    .bind(reminder.status)
    .bind(reminder.is_recurring)
    .bind(reminder.recurring_pattern)
    .bind(reminder.updated_at)
    .bind(reminder.completed_at)
    .bind(reminder.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Move a reminder out of `expected` into a new status.
///
/// Returns `false` if the row was no longer in `expected`, which means a
/// concurrent transition won.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    id: Uuid,
    expected: ReminderStatus,
    next: ReminderStatus,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE reminders SET status = ?, completed_at = ?, updated_at = ? \
         WHERE id = ? AND status = ?",
    )
    .bind(next)
    .bind(completed_at)
    .bind(now)
    .bind(id)
    .bind(expected)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM reminders WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Persist `overdue` on every active reminder due before `today` whose pin
/// is still active. Returns the number of reminders changed.
pub async fn mark_overdue(
    conn: &mut SqliteConnection,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "UPDATE reminders SET status = 'overdue', updated_at = ? \
         WHERE status = 'active' AND due_date < ? \
         AND plant_id IN (SELECT id FROM pins WHERE is_active = 1)",
    )
    .bind(now)
    .bind(today)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
