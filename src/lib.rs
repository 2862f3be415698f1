// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fleet Workshop: maintenance and telemetry tracking for workshops.
//!
//! This crate provides the backend API where workshops register drivers,
//! vehicles, maintenances and schedules, and where onboard devices report
//! vehicle telemetry.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CalendarClient, MailerClient, VehicleLookupClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub calendar: CalendarClient,
    pub mailer: MailerClient,
    pub vehicle_lookup: VehicleLookupClient,
}

impl AppState {
    /// Build state with outbound clients configured from `config`.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let calendar = CalendarClient::new(config.calendar_api_token.clone());
        let mailer = MailerClient::new(config.mail_api_key.clone(), config.mail_from.clone());
        let vehicle_lookup = VehicleLookupClient::new(&config.vehicle_lookup_url);
        Self {
            config,
            db,
            calendar,
            mailer,
            vehicle_lookup,
        }
    }
}
