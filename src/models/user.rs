//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform operator, sees everything
    Master,
    /// Workshop owner, sees its workshop's records
    Organization,
    /// End customer (driver), sees own vehicles
    User,
}

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (also the driver document ID for `user` role)
    pub id: String,
    /// Login e-mail, stored lowercase
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Workshop owned (organization) or attended (user)
    #[serde(default)]
    pub workshop_id: Option<String>,
    /// bcrypt hash
    pub password_hash: String,
    pub created_at: String,
}
