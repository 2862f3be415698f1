// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregation.
//!
//! Joins scope → vehicles → latest reading → maintenances and derives
//! maintenance status and alarms per vehicle. Status and alarms are
//! computed on every request and never stored.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::maintenance::LeadTime;
use crate::models::{Alarm, Contract, Driver, Maintenance, MaintenanceStatus, Reading, Vehicle};
use crate::services::scope::{visible_vehicles, Scope};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_CONCURRENT_DB_OPS: usize = 20;

/// Derived state of one maintenance.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MaintenanceSummary {
    pub id: String,
    pub service: String,
    pub km_limit: Option<f64>,
    pub date_limit: Option<String>,
    pub status: MaintenanceStatus,
}

/// Dashboard card for one vehicle.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VehicleSummary {
    pub vehicle_id: String,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub owner_id: String,
    pub owner_name: Option<String>,
    pub workshop_id: Option<String>,
    pub current_km: f64,
    pub last_reading_at: Option<String>,
    pub alarms: Vec<Alarm>,
    pub maintenances: Vec<MaintenanceSummary>,
}

/// Count of open maintenances per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatusTotals {
    pub upcoming: u32,
    pub approaching: u32,
    pub overdue: u32,
}

impl StatusTotals {
    fn add(&mut self, status: MaintenanceStatus) {
        match status {
            MaintenanceStatus::Upcoming => self.upcoming += 1,
            MaintenanceStatus::Approaching => self.approaching += 1,
            MaintenanceStatus::Overdue => self.overdue += 1,
        }
    }
}

/// Full dashboard response.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Dashboard {
    pub vehicles: Vec<VehicleSummary>,
    pub totals: StatusTotals,
    pub vehicles_with_alarms: u32,
    pub generated_at: String,
}

/// Summarize one vehicle from already-fetched records.
///
/// `lead_for` gives the lead time of the contract governing each
/// maintenance. Done maintenances are left out; the rest are sorted most
/// urgent first.
pub fn summarize_vehicle(
    vehicle: &Vehicle,
    owner: Option<&Driver>,
    latest: Option<&Reading>,
    maintenances: &[Maintenance],
    lead_for: impl Fn(&Maintenance) -> LeadTime,
    now: DateTime<Utc>,
) -> VehicleSummary {
    let current_km = vehicle.current_km(latest);

    let mut summaries: Vec<MaintenanceSummary> = maintenances
        .iter()
        .filter(|m| !m.done)
        .map(|m| MaintenanceSummary {
            id: m.id.clone(),
            service: m.service.clone(),
            km_limit: m.km_limit,
            date_limit: m.date_limit.clone(),
            status: m.status(current_km, lead_for(m), now),
        })
        .collect();
    summaries.sort_by_key(|m| urgency(m.status));

    VehicleSummary {
        vehicle_id: vehicle.id.clone(),
        plate: vehicle.plate.clone(),
        brand: vehicle.brand.clone(),
        model: vehicle.model.clone(),
        owner_id: vehicle.owner_id.clone(),
        owner_name: owner.map(|d| d.name.clone()),
        workshop_id: owner.and_then(Driver::workshop).map(str::to_string),
        current_km,
        last_reading_at: latest.map(|r| r.recorded_at.clone()),
        alarms: latest
            .map(|r| vehicle.thresholds.evaluate(r))
            .unwrap_or_default(),
        maintenances: summaries,
    }
}

fn urgency(status: MaintenanceStatus) -> u8 {
    match status {
        MaintenanceStatus::Overdue => 0,
        MaintenanceStatus::Approaching => 1,
        MaintenanceStatus::Upcoming => 2,
    }
}

/// Fold vehicle summaries into a dashboard.
pub fn assemble(mut vehicles: Vec<VehicleSummary>, now: DateTime<Utc>) -> Dashboard {
    let mut totals = StatusTotals::default();
    for m in vehicles.iter().flat_map(|v| &v.maintenances) {
        totals.add(m.status);
    }
    let vehicles_with_alarms = vehicles.iter().filter(|v| !v.alarms.is_empty()).count() as u32;

    // Vehicles needing attention first, then by plate for a stable order.
    vehicles.sort_by(|a, b| {
        let worst = |v: &VehicleSummary| {
            v.maintenances
                .first()
                .map(|m| urgency(m.status))
                .unwrap_or(u8::MAX)
        };
        worst(a)
            .cmp(&worst(b))
            .then_with(|| b.alarms.len().cmp(&a.alarms.len()))
            .then_with(|| a.plate.cmp(&b.plate))
    });

    Dashboard {
        vehicles,
        totals,
        vehicles_with_alarms,
        generated_at: crate::time_utils::format_utc_rfc3339(now),
    }
}

/// Lead time per workshop owning one of the open `maintenances`.
async fn lead_times<'a>(
    db: &FirestoreDb,
    maintenances: impl Iterator<Item = &'a Maintenance>,
) -> Result<HashMap<String, LeadTime>> {
    let workshop_ids: HashSet<String> = maintenances
        .filter(|m| !m.done)
        .map(|m| m.workshop_id.clone())
        .collect();

    stream::iter(workshop_ids)
        .map(|workshop_id| async move {
            let contract = db.contract_for_workshop(Some(&workshop_id)).await?;
            Ok::<_, AppError>((workshop_id, contract.lead_time()))
        })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .try_collect()
        .await
}

/// Build the dashboard for `scope`.
///
/// Any failed fetch fails the whole dashboard.
pub async fn build_dashboard(db: &FirestoreDb, scope: &Scope) -> Result<Dashboard> {
    let now = Utc::now();
    let vehicles = visible_vehicles(db, scope).await?;

    let fetched: Vec<VehicleRecords> = stream::iter(vehicles)
        .map(|(vehicle, owner)| async move {
            let (latest, maintenances) = tokio::try_join!(
                db.latest_reading(&vehicle.id),
                db.list_maintenances_for_vehicle(&vehicle.id)
            )?;
            // A vehicle keeps maintenances from workshops its owner has left.
            let maintenances = maintenances
                .into_iter()
                .filter(|m| scope.sees_maintenance(m, &vehicle))
                .collect();
            Ok::<_, AppError>(VehicleRecords {
                vehicle,
                owner,
                latest,
                maintenances,
            })
        })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .try_collect()
        .await?;

    let leads = lead_times(db, fetched.iter().flat_map(|r| &r.maintenances)).await?;
    let basic = Contract::basic().lead_time();

    let summaries = fetched
        .iter()
        .map(|r| {
            summarize_vehicle(
                &r.vehicle,
                r.owner.as_ref(),
                r.latest.as_ref(),
                &r.maintenances,
                |m| leads.get(&m.workshop_id).copied().unwrap_or(basic),
                now,
            )
        })
        .collect();

    let dashboard = assemble(summaries, now);
    tracing::debug!(
        vehicles = dashboard.vehicles.len(),
        overdue = dashboard.totals.overdue,
        approaching = dashboard.totals.approaching,
        "Dashboard built"
    );
    Ok(dashboard)
}

/// Records fetched for one vehicle card.
struct VehicleRecords {
    vehicle: Vehicle,
    owner: Option<Driver>,
    latest: Option<Reading>,
    maintenances: Vec<Maintenance>,
}
