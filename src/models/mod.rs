// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod pin;
pub mod project;
pub mod reminder;
pub mod user;

pub use pin::{Coordinates, CreatePinInput, MapBounds, Pin, UpdatePinInput};
pub use project::{
    CreateProjectInput, Project, ProjectMember, ProjectMembership, ProjectRole,
    UpdateProjectInput,
};
pub use reminder::{
    CreateReminderInput, NotificationType, QuickReminderPreset, RecurringPattern, Reminder,
    ReminderStatus, UpdateReminderInput,
};
pub use user::User;

/// Owned copy of `s` without surrounding whitespace.
fn trimmed(s: String) -> String {
    let t = s.trim();
    if t.len() == s.len() {
        s
    } else {
        t.to_string()
    }
}
