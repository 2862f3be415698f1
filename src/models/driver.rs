// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driver model (a workshop's end customer).

use serde::{Deserialize, Serialize};

/// A workshop client who owns vehicles.
///
/// Drivers that registered themselves share their document ID with their
/// `users` document; drivers created by a workshop have no login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    /// Document ID
    pub id: String,
    /// Linked user account, if the driver can log in
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Associated workshop; empty string when unassociated
    #[serde(default)]
    pub workshop_id: String,
    pub created_at: String,
}

impl Driver {
    /// The workshop this driver belongs to, if any.
    pub fn workshop(&self) -> Option<&str> {
        if self.workshop_id.is_empty() {
            None
        } else {
            Some(&self.workshop_id)
        }
    }
}
