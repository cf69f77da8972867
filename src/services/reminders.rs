// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder engine.
//!
//! Lifecycle:
//! - `active` -> `completed` (markCompleted), spawning a successor when recurring
//! - `active` -> `overdue` (sweep)
//! - `active` | `overdue` -> `dismissed`
//! - `overdue` -> `completed`
//!
//! `completed` and `dismissed` are terminal. Only the creator of a reminder
//! may change it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, Database};
use crate::error::{AppError, Result};
use crate::models::{
    CreateReminderInput, Pin, QuickReminderPreset, Reminder, ReminderStatus, UpdateReminderInput,
};
use crate::services::projects::has_access;
use crate::time_utils;

/// Result of completing a reminder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedReminder {
    #[serde(flatten)]
    pub reminder: Reminder,
    /// Successor scheduled by a recurring reminder
    pub next_reminder: Option<Reminder>,
}

#[derive(Clone)]
pub struct ReminderService {
    db: Database,
}

impl ReminderService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ─── Creation ───────────────────────────────────────────────────────────

    pub async fn create(&self, input: CreateReminderInput, user_id: Uuid) -> Result<Reminder> {
        let input = input.trimmed();
        input.validate()?;
        let due_date = parse_due_date(&input.due_date)?;
        let due_time = input
            .due_time
            .as_deref()
            .map(parse_due_time)
            .transpose()?
            .flatten();

        let now = Utc::now();
        let reminder = Reminder {
            id: Uuid::new_v4(),
            plant_id: input.plant_id,
            created_by_id: user_id,
            title: input.title,
            description: input.description,
            due_date,
            due_time,
            notification_type: input.notification_type,
            status: ReminderStatus::Active,
            is_recurring: input.is_recurring.unwrap_or(false),
            recurring_pattern: input.recurring_pattern.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let mut tx = self.db.begin().await?;
        require_visible_pin(&mut tx, reminder.plant_id, user_id).await?;
        db::reminders::insert(&mut tx, &reminder).await?;
        tx.commit().await?;

        tracing::info!(
            reminder_id = %reminder.id,
            plant_id = %reminder.plant_id,
            due_date = %reminder.due_date,
            "Created reminder"
        );
        Ok(reminder)
    }

    /// Create a recurring reminder from a preset, due one interval from today.
    pub async fn create_quick(
        &self,
        plant_id: Uuid,
        preset: QuickReminderPreset,
        user_id: Uuid,
    ) -> Result<Reminder> {
        let plan = preset.plan(time_utils::today_utc()).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Quick reminder due date out of range"))
        })?;

        let now = Utc::now();
        let reminder = Reminder {
            id: Uuid::new_v4(),
            plant_id,
            created_by_id: user_id,
            title: plan.title.to_string(),
            description: None,
            due_date: plan.due_date,
            due_time: None,
            notification_type: plan.notification_type,
            status: ReminderStatus::Active,
            is_recurring: true,
            recurring_pattern: plan.recurring_pattern,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let mut tx = self.db.begin().await?;
        require_visible_pin(&mut tx, plant_id, user_id).await?;
        db::reminders::insert(&mut tx, &reminder).await?;
        tx.commit().await?;

        tracing::info!(
            reminder_id = %reminder.id,
            plant_id = %plant_id,
            preset = ?preset,
            due_date = %reminder.due_date,
            "Created quick reminder"
        );
        Ok(reminder)
    }

    // ─── Mutations ──────────────────────────────────────────────────────────

    /// Apply a partial update, keeping `completedAt` set exactly when the
    /// status is `completed`.
    ///
    /// Status changes follow the lifecycle: a terminal reminder keeps its
    /// status, `active` and `overdue` follow the due date, and moving to
    /// `completed` schedules the successor of a recurring reminder just as
    /// [`ReminderService::mark_completed`] does.
    pub async fn update(
        &self,
        reminder_id: Uuid,
        patch: UpdateReminderInput,
        user_id: Uuid,
    ) -> Result<Reminder> {
        let patch = patch.trimmed();
        patch.validate()?;
        let completed_at = patch
            .completed_at
            .as_deref()
            .map(|raw| {
                time_utils::parse_timestamp(raw).ok_or_else(|| {
                    AppError::Validation(format!("Invalid completedAt: '{}'", raw))
                })
            })
            .transpose()?;

        let mut tx = self.db.begin().await?;
        let mut reminder = find_owned(&mut tx, reminder_id, user_id).await?;
        let previous = reminder.status;
        let now = Utc::now();

        if let Some(title) = patch.title {
            reminder.title = title;
        }
        if let Some(description) = patch.description {
            reminder.description = Some(description);
        }
        if let Some(raw) = patch.due_date.as_deref() {
            reminder.due_date = parse_due_date(raw)?;
        }
        if let Some(raw) = patch.due_time.as_deref() {
            reminder.due_time = parse_due_time(raw)?;
        }
        if let Some(notification_type) = patch.notification_type {
            reminder.notification_type = notification_type;
        }
        if let Some(pattern) = patch.recurring_pattern {
            reminder.recurring_pattern = pattern;
        }
        if let Some(is_recurring) = patch.is_recurring {
            reminder.is_recurring = is_recurring;
        }

        let status = next_status(&reminder, patch.status, time_utils::today_utc())?;
        reminder.completed_at = completion_stamp(&reminder, status, completed_at, now)?;
        reminder.status = status;
        reminder.updated_at = now;

        db::reminders::update(&mut tx, &reminder).await?;
        let next_reminder = if status == ReminderStatus::Completed && previous != status {
            schedule_successor(&mut tx, &reminder, now).await?
        } else {
            None
        };
        tx.commit().await?;

        tracing::info!(
            reminder_id = %reminder_id,
            from = ?previous,
            status = ?reminder.status,
            next_reminder_id = ?next_reminder.as_ref().map(|r| r.id),
            "Updated reminder"
        );
        Ok(reminder)
    }

    pub async fn delete(&self, reminder_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.db.begin().await?;
        find_owned(&mut tx, reminder_id, user_id).await?;
        db::reminders::delete(&mut tx, reminder_id).await?;
        tx.commit().await?;

        tracing::info!(reminder_id = %reminder_id, user_id = %user_id, "Deleted reminder");
        Ok(())
    }

    /// Complete a reminder. A recurring reminder schedules its successor in
    /// the same transaction.
    pub async fn mark_completed(
        &self,
        reminder_id: Uuid,
        user_id: Uuid,
    ) -> Result<CompletedReminder> {
        let mut tx = self.db.begin().await?;
        let mut reminder = find_owned(&mut tx, reminder_id, user_id).await?;
        let now = Utc::now();

        transition(&mut tx, &reminder, ReminderStatus::Completed, Some(now), now).await?;
        reminder.status = ReminderStatus::Completed;
        reminder.completed_at = Some(now);
        reminder.updated_at = now;

        let next_reminder = schedule_successor(&mut tx, &reminder, now).await?;
        tx.commit().await?;

        tracing::info!(
            reminder_id = %reminder_id,
            completed_at = %time_utils::format_utc_rfc3339(now),
            next_reminder_id = ?next_reminder.as_ref().map(|r| r.id),
            "Completed reminder"
        );
        Ok(CompletedReminder {
            reminder,
            next_reminder,
        })
    }

    pub async fn dismiss(&self, reminder_id: Uuid, user_id: Uuid) -> Result<Reminder> {
        let mut tx = self.db.begin().await?;
        let mut reminder = find_owned(&mut tx, reminder_id, user_id).await?;
        let now = Utc::now();

        transition(&mut tx, &reminder, ReminderStatus::Dismissed, None, now).await?;
        tx.commit().await?;

        reminder.status = ReminderStatus::Dismissed;
        reminder.completed_at = None;
        reminder.updated_at = now;

        tracing::info!(reminder_id = %reminder_id, "Dismissed reminder");
        Ok(reminder)
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// All reminders on a pin. Requires membership in the pin's project.
    pub async fn list_by_plant(&self, plant_id: Uuid, user_id: Uuid) -> Result<Vec<Reminder>> {
        let mut conn = self.db.acquire().await?;
        let pin = db::pins::find_active(&mut conn, plant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {}", plant_id)))?;
        if !has_access(&mut conn, pin.project_id, user_id).await? {
            tracing::warn!(plant_id = %plant_id, user_id = %user_id, "Reminder list denied");
            return Err(AppError::Forbidden(format!(
                "No access to reminders of pin {}",
                plant_id
            )));
        }

        Ok(db::reminders::list_by_plant(&mut conn, plant_id).await?)
    }

    pub async fn list_active_for_user(&self, user_id: Uuid) -> Result<Vec<Reminder>> {
        let mut conn = self.db.acquire().await?;
        let reminders =
            db::reminders::list_for_owner_with_status(&mut conn, user_id, ReminderStatus::Active)
                .await?;
        tracing::debug!(user_id = %user_id, count = reminders.len(), "Listed active reminders");
        Ok(reminders)
    }

    /// Overdue reminders as of today, whether or not the sweep has run.
    pub async fn list_overdue_for_user(&self, user_id: Uuid) -> Result<Vec<Reminder>> {
        let today = time_utils::today_utc();
        let mut conn = self.db.acquire().await?;
        let mut reminders =
            db::reminders::list_overdue_for_owner(&mut conn, user_id, today).await?;
        for reminder in &mut reminders {
            reminder.status = ReminderStatus::Overdue;
        }
        tracing::debug!(user_id = %user_id, count = reminders.len(), "Listed overdue reminders");
        Ok(reminders)
    }

    // ─── Scheduled ──────────────────────────────────────────────────────────

    /// Persist `overdue` on every active reminder due before today.
    pub async fn sweep_overdue(&self) -> Result<u64> {
        self.sweep_overdue_as_of(time_utils::today_utc()).await
    }

    /// Sweep against an explicit date. Idempotent for a given date.
    pub async fn sweep_overdue_as_of(&self, today: NaiveDate) -> Result<u64> {
        let mut conn = self.db.acquire().await?;
        let changed = db::reminders::mark_overdue(&mut conn, today, Utc::now()).await?;
        tracing::info!(today = %today, changed, "Overdue sweep finished");
        Ok(changed)
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// The pin must be active and the user a member of its project. Anything
/// else is `NotFound`, so private pins stay invisible.
async fn require_visible_pin(
    conn: &mut SqliteConnection,
    plant_id: Uuid,
    user_id: Uuid,
) -> Result<Pin> {
    let pin = db::pins::find_active(conn, plant_id).await?;
    if let Some(pin) = pin {
        if has_access(conn, pin.project_id, user_id).await? {
            return Ok(pin);
        }
        tracing::warn!(plant_id = %plant_id, user_id = %user_id, "Reminder pin access denied");
    }
    Err(AppError::NotFound(format!("Pin {}", plant_id)))
}

/// Load a reminder on an active pin and check the caller created it.
async fn find_owned(
    conn: &mut SqliteConnection,
    reminder_id: Uuid,
    user_id: Uuid,
) -> Result<Reminder> {
    let reminder = db::reminders::find_by_id(conn, reminder_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reminder {}", reminder_id)))?;

    if reminder.created_by_id != user_id {
        tracing::warn!(reminder_id = %reminder_id, user_id = %user_id, "Reminder access denied");
        return Err(AppError::Forbidden(
            "Only the creator can modify this reminder".to_string(),
        ));
    }
    Ok(reminder)
}

/// Move a non-terminal reminder to `next`, guarding against a concurrent
/// transition.
async fn transition(
    conn: &mut SqliteConnection,
    reminder: &Reminder,
    next: ReminderStatus,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<()> {
    if reminder.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Reminder {} is already {:?}",
            reminder.id, reminder.status
        )));
    }

    let moved = db::reminders::transition_status(
        conn,
        reminder.id,
        reminder.status,
        next,
        completed_at,
        now,
    )
    .await?;
    if !moved {
        return Err(AppError::Conflict(format!(
            "Reminder {} changed concurrently",
            reminder.id
        )));
    }
    Ok(())
}

/// Status a reminder ends up in after an update.
///
/// `completed` and `dismissed` never change. Otherwise an explicit
/// `completed` or `dismissed` is taken as given, while `active` and
/// `overdue` are derived from the due date: an overdue reminder moved to
/// today or later is active again.
fn next_status(
    reminder: &Reminder,
    requested: Option<ReminderStatus>,
    today: NaiveDate,
) -> Result<ReminderStatus> {
    let current = reminder.status;
    if current.is_terminal() {
        return match requested {
            None => Ok(current),
            Some(status) if status == current => Ok(current),
            Some(status) => Err(AppError::Conflict(format!(
                "Reminder {} is already {:?} and cannot become {:?}",
                reminder.id, current, status
            ))),
        };
    }

    let scheduled = if current == ReminderStatus::Overdue && reminder.due_date >= today {
        ReminderStatus::Active
    } else {
        current
    };

    match requested {
        None => Ok(scheduled),
        Some(status @ (ReminderStatus::Completed | ReminderStatus::Dismissed)) => Ok(status),
        Some(status) if status == scheduled => Ok(status),
        Some(status) => Err(AppError::Validation(format!(
            "Status {:?} does not match the due date {}",
            status, reminder.due_date
        ))),
    }
}

/// Insert the successor of a just-completed recurring reminder.
async fn schedule_successor(
    conn: &mut SqliteConnection,
    completed: &Reminder,
    now: DateTime<Utc>,
) -> Result<Option<Reminder>> {
    let Some(next) = successor(completed, now)? else {
        return Ok(None);
    };
    db::reminders::insert(conn, &next).await?;
    Ok(Some(next))
}

/// The next occurrence of a recurring reminder, if it has one.
fn successor(reminder: &Reminder, now: DateTime<Utc>) -> Result<Option<Reminder>> {
    if !reminder.spawns_successor() {
        return Ok(None);
    }
    let due_date = reminder
        .recurring_pattern
        .advance(reminder.due_date)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Recurring due date out of range")))?;

    Ok(Some(Reminder {
        id: Uuid::new_v4(),
        plant_id: reminder.plant_id,
        created_by_id: reminder.created_by_id,
        title: reminder.title.clone(),
        description: reminder.description.clone(),
        due_date,
        due_time: reminder.due_time,
        notification_type: reminder.notification_type,
        status: ReminderStatus::Active,
        is_recurring: reminder.is_recurring,
        recurring_pattern: reminder.recurring_pattern,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }))
}

/// `completedAt` for a reminder moving to `status`.
fn completion_stamp(
    reminder: &Reminder,
    status: ReminderStatus,
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    if status != ReminderStatus::Completed {
        if requested.is_some() {
            return Err(AppError::Validation(
                "completedAt can only be set when status is completed".to_string(),
            ));
        }
        return Ok(None);
    }
    Ok(Some(
        requested.or(reminder.completed_at).unwrap_or(now),
    ))
}

fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    time_utils::parse_date(raw)
        .ok_or_else(|| AppError::Validation(format!("Invalid dueDate: '{}'", raw)))
}

/// Parse a due time; the empty string clears it.
fn parse_due_time(raw: &str) -> Result<Option<chrono::NaiveTime>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    time_utils::parse_time(raw)
        .map(Some)
        .ok_or_else(|| AppError::Validation(format!("Invalid dueTime: '{}'", raw)))
}
