//! Workshop service catalog entries.

use serde::{Deserialize, Serialize};

/// A priced service offered by one workshop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOffering {
    /// Document ID
    pub id: String,
    pub workshop_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
}
