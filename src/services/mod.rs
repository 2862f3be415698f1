// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer and outbound API clients.

pub mod calendar;
pub mod dashboard;
pub mod http;
pub mod mailer;
pub mod scope;
pub mod vehicle_lookup;

pub use calendar::CalendarClient;
pub use mailer::MailerClient;
pub use scope::Scope;
pub use vehicle_lookup::VehicleLookupClient;
