// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod identity;
pub mod pins;
pub mod projects;
pub mod reminders;

pub use identity::{ExternalIdentity, IdentityService};
pub use pins::PinService;
pub use projects::ProjectService;
pub use reminders::{CompletedReminder, ReminderService};
