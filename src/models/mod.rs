// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contract;
pub mod driver;
pub mod maintenance;
pub mod reading;
pub mod schedule;
pub mod service;
pub mod user;
pub mod vehicle;
pub mod workshop;

pub use contract::Contract;
pub use driver::Driver;
pub use maintenance::{Maintenance, MaintenanceStatus};
pub use reading::Reading;
pub use schedule::Schedule;
pub use service::ServiceOffering;
pub use user::{Role, User};
pub use vehicle::{Alarm, AlarmThresholds, Vehicle};
pub use workshop::Workshop;
