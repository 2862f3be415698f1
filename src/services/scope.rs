// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-based visibility.
//!
//! Every read goes through a [`Scope`]. Records outside the caller's scope
//! are reported as not found so IDs cannot be enumerated.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Driver, Maintenance, Role, Vehicle};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 20;

/// The set of records a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Master: everything
    All,
    /// Organization: records of one workshop
    Workshop(String),
    /// User: the caller's own driver record and vehicles
    Driver(String),
}

impl Scope {
    pub fn for_user(user: &AuthUser) -> Result<Self> {
        match user.role {
            Role::Master => Ok(Scope::All),
            Role::Organization => user
                .workshop_id
                .clone()
                .filter(|w| !w.is_empty())
                .map(Scope::Workshop)
                .ok_or_else(|| {
                    AppError::Forbidden("organization account has no workshop".to_string())
                }),
            Role::User => Ok(Scope::Driver(user.user_id.clone())),
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self, Scope::All)
    }

    pub fn require_master(&self) -> Result<()> {
        if self.is_master() {
            Ok(())
        } else {
            Err(AppError::Forbidden("master access required".to_string()))
        }
    }

    /// Whether the caller may write records owned by `workshop_id`.
    pub fn manages_workshop(&self, workshop_id: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Workshop(w) => w == workshop_id,
            Scope::Driver(_) => false,
        }
    }

    pub fn require_manager(&self, workshop_id: &str) -> Result<()> {
        if self.manages_workshop(workshop_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "only the owning workshop may change this record".to_string(),
            ))
        }
    }

    pub fn sees_driver(&self, driver: &Driver) -> bool {
        match self {
            Scope::All => true,
            Scope::Workshop(w) => driver.workshop() == Some(w.as_str()),
            Scope::Driver(d) => &driver.id == d,
        }
    }

    /// `owner` is the vehicle's owning driver, if it still exists.
    pub fn sees_vehicle(&self, vehicle: &Vehicle, owner: Option<&Driver>) -> bool {
        match self {
            Scope::All => true,
            Scope::Workshop(w) => owner.and_then(Driver::workshop) == Some(w.as_str()),
            Scope::Driver(d) => &vehicle.owner_id == d,
        }
    }

    pub fn sees_maintenance(&self, maintenance: &Maintenance, vehicle: &Vehicle) -> bool {
        match self {
            Scope::All => true,
            Scope::Workshop(w) => &maintenance.workshop_id == w,
            Scope::Driver(d) => &vehicle.owner_id == d,
        }
    }
}

// ─── Scoped Loaders ──────────────────────────────────────────

/// Load a driver visible to `scope`.
pub async fn load_driver(db: &FirestoreDb, scope: &Scope, driver_id: &str) -> Result<Driver> {
    db.get_driver(driver_id)
        .await?
        .filter(|d| scope.sees_driver(d))
        .ok_or_else(|| AppError::NotFound(format!("Driver {} not found", driver_id)))
}

/// Load a vehicle visible to `scope`, with its owning driver.
pub async fn load_vehicle(
    db: &FirestoreDb,
    scope: &Scope,
    vehicle_id: &str,
) -> Result<(Vehicle, Option<Driver>)> {
    let not_found = || AppError::NotFound(format!("Vehicle {} not found", vehicle_id));

    let vehicle = db.get_vehicle(vehicle_id).await?.ok_or_else(not_found)?;
    let owner = db.get_driver(&vehicle.owner_id).await?;

    if !scope.sees_vehicle(&vehicle, owner.as_ref()) {
        return Err(not_found());
    }
    Ok((vehicle, owner))
}

/// Load a maintenance visible to `scope`, with its vehicle.
pub async fn load_maintenance(
    db: &FirestoreDb,
    scope: &Scope,
    maintenance_id: &str,
) -> Result<(Maintenance, Vehicle)> {
    let not_found = || AppError::NotFound(format!("Maintenance {} not found", maintenance_id));

    let maintenance = db.get_maintenance(maintenance_id).await?.ok_or_else(not_found)?;
    let vehicle = db
        .get_vehicle(&maintenance.vehicle_id)
        .await?
        .ok_or_else(not_found)?;

    if !scope.sees_maintenance(&maintenance, &vehicle) {
        return Err(not_found());
    }
    Ok((maintenance, vehicle))
}

/// Drivers visible to `scope`.
pub async fn visible_drivers(db: &FirestoreDb, scope: &Scope) -> Result<Vec<Driver>> {
    match scope {
        Scope::All => db.list_drivers().await,
        Scope::Workshop(w) => db.list_drivers_for_workshop(w).await,
        Scope::Driver(d) => Ok(db.get_driver(d).await?.into_iter().collect()),
    }
}

/// Vehicles visible to `scope`, each paired with its owning driver.
pub async fn visible_vehicles(
    db: &FirestoreDb,
    scope: &Scope,
) -> Result<Vec<(Vehicle, Option<Driver>)>> {
    match scope {
        Scope::All => {
            let (vehicles, drivers) = tokio::try_join!(db.list_vehicles(), db.list_drivers())?;
            let by_id: HashMap<String, Driver> =
                drivers.into_iter().map(|d| (d.id.clone(), d)).collect();
            Ok(vehicles
                .into_iter()
                .map(|v| {
                    let owner = by_id.get(&v.owner_id).cloned();
                    (v, owner)
                })
                .collect())
        }
        Scope::Workshop(w) => {
            let drivers = db.list_drivers_for_workshop(w).await?;
            let per_driver: Vec<Vec<(Vehicle, Option<Driver>)>> = stream::iter(drivers)
                .map(|driver| async move {
                    let vehicles = db.list_vehicles_for_owner(&driver.id).await?;
                    Ok::<_, AppError>(
                        vehicles
                            .into_iter()
                            .map(|v| (v, Some(driver.clone())))
                            .collect::<Vec<_>>(),
                    )
                })
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .try_collect()
                .await?;
            Ok(per_driver.into_iter().flatten().collect())
        }
        Scope::Driver(d) => {
            let (vehicles, driver) =
                tokio::try_join!(db.list_vehicles_for_owner(d), db.get_driver(d))?;
            Ok(vehicles
                .into_iter()
                .map(|v| (v, driver.clone()))
                .collect())
        }
    }
}
