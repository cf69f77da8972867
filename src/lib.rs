// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Plant Tracker: collaborative plant tracking backend
//!
//! Users group geotagged plants (pins) into projects they share with other
//! members, and schedule care reminders against those plants.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{IdentityService, PinService, ProjectService, ReminderService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub identity_service: IdentityService,
    pub project_service: ProjectService,
    pub pin_service: PinService,
    pub reminder_service: ReminderService,
}

impl AppState {
    /// Wire every service to the same database handle.
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            identity_service: IdentityService::new(db.clone()),
            project_service: ProjectService::new(db.clone()),
            pin_service: PinService::new(db.clone()),
            reminder_service: ReminderService::new(db.clone()),
            config,
            db,
        }
    }
}
