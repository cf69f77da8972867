// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder model, recurrence arithmetic and quick-reminder presets.

use chrono::{DateTime, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    General,
    Warning,
    Alert,
}

/// Lifecycle state of a reminder. `Completed` and `Dismissed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Active,
    Completed,
    Dismissed,
    Overdue,
}

impl ReminderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReminderStatus::Completed | ReminderStatus::Dismissed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurringPattern {
    #[default]
    None,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringPattern {
    /// Advance a due date by one interval of this pattern.
    ///
    /// Month and year steps are calendar based and clamp to the last day of
    /// the target month (Jan 31 + 1 month = Feb 28/29). Returns `None` for
    /// `RecurringPattern::None` or on calendar overflow.
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            RecurringPattern::None => None,
            RecurringPattern::Weekly => date.checked_add_days(Days::new(7)),
            RecurringPattern::Monthly => date.checked_add_months(Months::new(1)),
            RecurringPattern::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

/// A date-scheduled reminder attached to a pin.
///
/// Ownership is stored on the reminder itself (`created_by_id`).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub plant_id: Uuid,
    pub created_by_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub due_time: Option<NaiveTime>,
    pub notification_type: NotificationType,
    pub status: ReminderStatus,
    pub is_recurring: bool,
    pub recurring_pattern: RecurringPattern,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Reminder {
    /// Whether completing this reminder schedules a successor.
    pub fn spawns_successor(&self) -> bool {
        self.is_recurring && self.recurring_pattern != RecurringPattern::None
    }
}

/// Input for creating a reminder.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderInput {
    #[validate(length(min = 1, max = 255, message = "Reminder title must not be empty"))]
    pub title: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD` or RFC3339
    pub due_date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub due_time: Option<String>,
    pub notification_type: NotificationType,
    pub recurring_pattern: Option<RecurringPattern>,
    pub is_recurring: Option<bool>,
    pub plant_id: Uuid,
}

/// Partial update for a reminder. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderInput {
    #[validate(length(min = 1, max = 255, message = "Reminder title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub due_time: Option<String>,
    pub notification_type: Option<NotificationType>,
    pub status: Option<ReminderStatus>,
    pub recurring_pattern: Option<RecurringPattern>,
    pub is_recurring: Option<bool>,
    /// RFC3339 or `YYYY-MM-DD`; only valid together with status `completed`
    pub completed_at: Option<String>,
}

impl CreateReminderInput {
    /// Strip surrounding whitespace before validation.
    pub fn trimmed(mut self) -> Self {
        self.title = super::trimmed(self.title);
        self
    }
}

impl UpdateReminderInput {
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.map(super::trimmed);
        self
    }
}

/// Preset for one-tap reminder creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickReminderPreset {
    Weekly,
    Monthly,
    Yearly,
    Photo,
}

/// Fields a preset fills in, relative to a starting date.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickReminderPlan {
    pub title: &'static str,
    pub due_date: NaiveDate,
    pub notification_type: NotificationType,
    pub recurring_pattern: RecurringPattern,
}

impl std::str::FromStr for QuickReminderPreset {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(QuickReminderPreset::Weekly),
            "monthly" => Ok(QuickReminderPreset::Monthly),
            "yearly" => Ok(QuickReminderPreset::Yearly),
            "photo" => Ok(QuickReminderPreset::Photo),
            other => Err(crate::error::AppError::Validation(format!(
                "Unknown quick reminder type '{}': expected weekly, monthly, yearly or photo",
                other
            ))),
        }
    }
}

impl QuickReminderPreset {
    pub fn pattern(self) -> RecurringPattern {
        match self {
            QuickReminderPreset::Weekly => RecurringPattern::Weekly,
            QuickReminderPreset::Monthly => RecurringPattern::Monthly,
            QuickReminderPreset::Yearly | QuickReminderPreset::Photo => RecurringPattern::Yearly,
        }
    }

    /// Build the reminder fields for this preset starting from `today`.
    pub fn plan(self, today: NaiveDate) -> Option<QuickReminderPlan> {
        let (title, notification_type) = match self {
            QuickReminderPreset::Weekly => ("Water plant", NotificationType::Warning),
            QuickReminderPreset::Monthly => ("Fertilize", NotificationType::Warning),
            QuickReminderPreset::Yearly => ("Prune", NotificationType::Warning),
            QuickReminderPreset::Photo => ("Update plant photo", NotificationType::General),
        };
        let recurring_pattern = self.pattern();

        Some(QuickReminderPlan {
            title,
            due_date: recurring_pattern.advance(today)?,
            notification_type,
            recurring_pattern,
        })
    }
}
