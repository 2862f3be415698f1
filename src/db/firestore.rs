// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and account registration
//! - Workshops and contracts
//! - Drivers and vehicles
//! - Maintenances, schedules and the service catalog
//! - Telemetry readings (append-only)
//!
//! No referential integrity is enforced by storage; callers check the
//! invariants they need before writing.

use crate::db::collections;
use crate::error::AppError;
use crate::models::contract::Contract;
use crate::models::workshop::ContractRef;
use crate::models::{
    Driver, Maintenance, Reading, Schedule, ServiceOffering, User, Vehicle, Workshop,
};
use serde::{de::DeserializeOwned, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Helpers ─────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(db_err)
    }

    /// Full-document overwrite (creates the document if missing).
    async fn put_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_all<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// All documents whose `field` equals `value`.
    async fn list_where<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let value = value.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    /// Find a user by login e-mail (stored lowercase).
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .list_where(collections::USERS, "email", &email.to_lowercase())
            .await?;
        Ok(users.into_iter().next())
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.put_doc(collections::USERS, &user.id, user).await
    }

    /// Atomically create a user together with its workshop or driver record.
    pub async fn create_account(
        &self,
        user: &User,
        workshop: Option<&Workshop>,
        driver: Option<&Driver>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        if let Some(workshop) = workshop {
            client
                .fluent()
                .update()
                .in_col(collections::WORKSHOPS)
                .document_id(&workshop.id)
                .object(workshop)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add workshop to transaction: {}", e))
                })?;
        }

        if let Some(driver) = driver {
            client
                .fluent()
                .update()
                .in_col(collections::DRIVERS)
                .document_id(&driver.id)
                .object(driver)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add driver to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %user.id,
            role = ?user.role,
            "Account created"
        );

        Ok(())
    }

    // ─── Workshop Operations ─────────────────────────────────────

    pub async fn get_workshop(&self, workshop_id: &str) -> Result<Option<Workshop>, AppError> {
        self.get_doc(collections::WORKSHOPS, workshop_id).await
    }

    pub async fn list_workshops(&self) -> Result<Vec<Workshop>, AppError> {
        self.list_all(collections::WORKSHOPS).await
    }

    pub async fn upsert_workshop(&self, workshop: &Workshop) -> Result<(), AppError> {
        self.put_doc(collections::WORKSHOPS, &workshop.id, workshop)
            .await
    }

    /// Delete a workshop with its catalog, schedules and maintenances.
    ///
    /// Drivers are unassociated (workshop reference blanked), not deleted.
    /// Returns the number of documents deleted.
    pub async fn delete_workshop(&self, workshop_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        let services: Vec<ServiceOffering> = self
            .list_where(collections::SERVICES, "workshop_id", workshop_id)
            .await?;
        self.batch_delete(&services, collections::SERVICES, |s: &ServiceOffering| {
            s.id.clone()
        })
        .await?;
        deleted_count += services.len();

        let schedules = self.list_schedules_for_workshop(workshop_id).await?;
        self.batch_delete(&schedules, collections::SCHEDULES, |s: &Schedule| {
            s.id.clone()
        })
        .await?;
        deleted_count += schedules.len();

        let maintenances = self.list_maintenances_for_workshop(workshop_id).await?;
        self.batch_delete(&maintenances, collections::MAINTENANCES, |m: &Maintenance| {
            m.id.clone()
        })
        .await?;
        deleted_count += maintenances.len();

        // Per-document updates without rollback; a failure leaves the rest associated.
        let drivers = self.list_drivers_for_workshop(workshop_id).await?;
        for mut driver in drivers {
            driver.workshop_id.clear();
            self.upsert_driver(&driver).await?;
        }

        self.delete_doc(collections::WORKSHOPS, workshop_id).await?;
        deleted_count += 1;

        tracing::info!(workshop_id, deleted_count, "Workshop deleted");

        Ok(deleted_count)
    }

    // ─── Contract Operations ─────────────────────────────────────

    pub async fn get_contract(&self, contract_id: &str) -> Result<Option<Contract>, AppError> {
        self.get_doc(collections::CONTRACTS, contract_id).await
    }

    pub async fn list_contracts(&self) -> Result<Vec<Contract>, AppError> {
        self.list_all(collections::CONTRACTS).await
    }

    pub async fn upsert_contract(&self, contract: &Contract) -> Result<(), AppError> {
        self.put_doc(collections::CONTRACTS, &contract.id, contract)
            .await
    }

    pub async fn delete_contract(&self, contract_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::CONTRACTS, contract_id).await
    }

    /// Resolve the contract a workshop points at (`"basic"` is built in).
    pub async fn resolve_contract(&self, workshop: &Workshop) -> Result<Contract, AppError> {
        match workshop.contract_ref() {
            ContractRef::Basic => Ok(Contract::basic()),
            ContractRef::Id(id) => self
                .get_contract(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id))),
        }
    }

    /// Contract governing a workshop ID; unknown or absent workshop means basic.
    pub async fn contract_for_workshop(
        &self,
        workshop_id: Option<&str>,
    ) -> Result<Contract, AppError> {
        let Some(workshop_id) = workshop_id else {
            return Ok(Contract::basic());
        };
        match self.get_workshop(workshop_id).await? {
            Some(workshop) => self.resolve_contract(&workshop).await,
            None => Ok(Contract::basic()),
        }
    }

    // ─── Driver Operations ───────────────────────────────────────

    pub async fn get_driver(&self, driver_id: &str) -> Result<Option<Driver>, AppError> {
        self.get_doc(collections::DRIVERS, driver_id).await
    }

    pub async fn list_drivers(&self) -> Result<Vec<Driver>, AppError> {
        self.list_all(collections::DRIVERS).await
    }

    pub async fn list_drivers_for_workshop(
        &self,
        workshop_id: &str,
    ) -> Result<Vec<Driver>, AppError> {
        self.list_where(collections::DRIVERS, "workshop_id", workshop_id)
            .await
    }

    pub async fn upsert_driver(&self, driver: &Driver) -> Result<(), AppError> {
        self.put_doc(collections::DRIVERS, &driver.id, driver).await
    }

    pub async fn delete_driver(&self, driver_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::DRIVERS, driver_id).await
    }

    // ─── Vehicle Operations ──────────────────────────────────────

    pub async fn get_vehicle(&self, vehicle_id: &str) -> Result<Option<Vehicle>, AppError> {
        self.get_doc(collections::VEHICLES, vehicle_id).await
    }

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        self.list_all(collections::VEHICLES).await
    }

    pub async fn list_vehicles_for_owner(&self, owner_id: &str) -> Result<Vec<Vehicle>, AppError> {
        self.list_where(collections::VEHICLES, "owner_id", owner_id)
            .await
    }

    /// Find a vehicle by normalized plate.
    pub async fn find_vehicle_by_plate(&self, plate: &str) -> Result<Option<Vehicle>, AppError> {
        let vehicles: Vec<Vehicle> = self
            .list_where(collections::VEHICLES, "plate", plate)
            .await?;
        Ok(vehicles.into_iter().next())
    }

    pub async fn upsert_vehicle(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        self.put_doc(collections::VEHICLES, &vehicle.id, vehicle)
            .await
    }

    /// Delete a vehicle with its readings, maintenances and schedules.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_vehicle(&self, vehicle_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        let readings: Vec<Reading> = self
            .list_where(collections::READINGS, "vehicle_id", vehicle_id)
            .await?;
        self.batch_delete(&readings, collections::READINGS, |r: &Reading| r.id.clone())
            .await?;
        deleted_count += readings.len();
        tracing::debug!(vehicle_id, count = readings.len(), "Deleted readings");

        let schedules: Vec<Schedule> = self
            .list_where(collections::SCHEDULES, "vehicle_id", vehicle_id)
            .await?;
        self.batch_delete(&schedules, collections::SCHEDULES, |s: &Schedule| {
            s.id.clone()
        })
        .await?;
        deleted_count += schedules.len();

        let maintenances = self.list_maintenances_for_vehicle(vehicle_id).await?;
        self.batch_delete(&maintenances, collections::MAINTENANCES, |m: &Maintenance| {
            m.id.clone()
        })
        .await?;
        deleted_count += maintenances.len();

        self.delete_doc(collections::VEHICLES, vehicle_id).await?;
        deleted_count += 1;

        tracing::info!(vehicle_id, deleted_count, "Vehicle deleted");

        Ok(deleted_count)
    }

    // ─── Maintenance Operations ──────────────────────────────────

    pub async fn get_maintenance(
        &self,
        maintenance_id: &str,
    ) -> Result<Option<Maintenance>, AppError> {
        self.get_doc(collections::MAINTENANCES, maintenance_id)
            .await
    }

    pub async fn list_maintenances(&self) -> Result<Vec<Maintenance>, AppError> {
        self.list_all(collections::MAINTENANCES).await
    }

    pub async fn list_maintenances_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> Result<Vec<Maintenance>, AppError> {
        self.list_where(collections::MAINTENANCES, "vehicle_id", vehicle_id)
            .await
    }

    pub async fn list_maintenances_for_workshop(
        &self,
        workshop_id: &str,
    ) -> Result<Vec<Maintenance>, AppError> {
        self.list_where(collections::MAINTENANCES, "workshop_id", workshop_id)
            .await
    }

    pub async fn upsert_maintenance(&self, maintenance: &Maintenance) -> Result<(), AppError> {
        self.put_doc(collections::MAINTENANCES, &maintenance.id, maintenance)
            .await
    }

    pub async fn delete_maintenance(&self, maintenance_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::MAINTENANCES, maintenance_id)
            .await
    }

    // ─── Reading Operations ──────────────────────────────────────

    /// Append a telemetry reading.
    pub async fn add_reading(&self, reading: &Reading) -> Result<(), AppError> {
        self.put_doc(collections::READINGS, &reading.id, reading)
            .await
    }

    /// Most recent readings for a vehicle, newest first.
    pub async fn list_readings(
        &self,
        vehicle_id: &str,
        limit: u32,
    ) -> Result<Vec<Reading>, AppError> {
        let vehicle_id = vehicle_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::READINGS)
            .filter(move |q| q.for_all([q.field("vehicle_id").eq(vehicle_id.clone())]))
            .order_by([(
                "recorded_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    pub async fn latest_reading(&self, vehicle_id: &str) -> Result<Option<Reading>, AppError> {
        Ok(self.list_readings(vehicle_id, 1).await?.into_iter().next())
    }

    // ─── Schedule Operations ─────────────────────────────────────

    pub async fn get_schedule(&self, schedule_id: &str) -> Result<Option<Schedule>, AppError> {
        self.get_doc(collections::SCHEDULES, schedule_id).await
    }

    pub async fn list_schedules(&self) -> Result<Vec<Schedule>, AppError> {
        self.list_all(collections::SCHEDULES).await
    }

    pub async fn list_schedules_for_workshop(
        &self,
        workshop_id: &str,
    ) -> Result<Vec<Schedule>, AppError> {
        self.list_where(collections::SCHEDULES, "workshop_id", workshop_id)
            .await
    }

    pub async fn list_schedules_for_vehicle(
        &self,
        vehicle_id: &str,
    ) -> Result<Vec<Schedule>, AppError> {
        self.list_where(collections::SCHEDULES, "vehicle_id", vehicle_id)
            .await
    }

    /// Schedules of a workshop with `from <= start < until`.
    ///
    /// `from = None` means unbounded below; the conflict check uses it to
    /// fetch every booking starting before a candidate window ends.
    pub async fn list_schedules_starting_between(
        &self,
        workshop_id: &str,
        from: Option<&str>,
        until: &str,
    ) -> Result<Vec<Schedule>, AppError> {
        let workshop_id = workshop_id.to_string();
        let from = from.map(str::to_string);
        let until = until.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::SCHEDULES)
            .filter(move |q| {
                q.for_all([
                    q.field("workshop_id").eq(workshop_id.clone()),
                    q.field("start").less_than(until.clone()),
                    from.clone()
                        .and_then(|from| q.field("start").greater_than_or_equal(from)),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    pub async fn upsert_schedule(&self, schedule: &Schedule) -> Result<(), AppError> {
        self.put_doc(collections::SCHEDULES, &schedule.id, schedule)
            .await
    }

    pub async fn delete_schedule(&self, schedule_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::SCHEDULES, schedule_id).await
    }

    // ─── Service Catalog Operations ──────────────────────────────

    pub async fn get_service(&self, service_id: &str) -> Result<Option<ServiceOffering>, AppError> {
        self.get_doc(collections::SERVICES, service_id).await
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceOffering>, AppError> {
        self.list_all(collections::SERVICES).await
    }

    pub async fn list_services_for_workshop(
        &self,
        workshop_id: &str,
    ) -> Result<Vec<ServiceOffering>, AppError> {
        self.list_where(collections::SERVICES, "workshop_id", workshop_id)
            .await
    }

    pub async fn upsert_service(&self, service: &ServiceOffering) -> Result<(), AppError> {
        self.put_doc(collections::SERVICES, &service.id, service)
            .await
    }

    pub async fn delete_service(&self, service_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::SERVICES, service_id).await
    }
}
