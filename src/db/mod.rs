//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKSHOPS: &str = "workshops";
    pub const CONTRACTS: &str = "contracts";
    pub const DRIVERS: &str = "drivers";
    pub const VEHICLES: &str = "vehicles";
    pub const MAINTENANCES: &str = "maintenances";
    /// Telemetry readings (append-only)
    pub const READINGS: &str = "readings";
    pub const SCHEDULES: &str = "schedules";
    /// Workshop service catalog
    pub const SERVICES: &str = "services";
}
