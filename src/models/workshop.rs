// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workshop ("oficina") model.

use crate::models::contract::{Contract, BASIC_CONTRACT_ID};
use crate::time_utils::parse_utc;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A registered service-provider organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workshop {
    /// Document ID
    pub id: String,
    pub name: String,
    /// Company registration number
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Contract ID, or `"basic"`
    pub contract: String,
    /// Owning organization user
    #[serde(default)]
    pub owner_id: Option<String>,
    /// External calendar mirroring this workshop's schedules
    #[serde(default)]
    pub calendar_id: Option<String>,
    pub created_at: String,
}

/// Which contract a workshop points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractRef<'a> {
    Basic,
    Id(&'a str),
}

impl Workshop {
    pub fn contract_ref(&self) -> ContractRef<'_> {
        if self.contract.is_empty() || self.contract == BASIC_CONTRACT_ID {
            ContractRef::Basic
        } else {
            ContractRef::Id(&self.contract)
        }
    }

    /// Whether premium features (calendar mirroring, e-mailed reports) are on.
    ///
    /// `contract` must be the resolved contract of this workshop.
    pub fn is_premium(&self, contract: &Contract, now: DateTime<Utc>) -> bool {
        if self.contract_ref() != ContractRef::Basic {
            return true;
        }
        match parse_utc(&self.created_at) {
            Some(created) => created + Duration::days(i64::from(contract.free_trial_days)) > now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn workshop(contract: &str, created_at: &str) -> Workshop {
        Workshop {
            id: "w1".to_string(),
            name: "Oficina Central".to_string(),
            cnpj: None,
            phone: None,
            address: None,
            contract: contract.to_string(),
            owner_id: Some("u1".to_string()),
            calendar_id: None,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_contract_ref() {
        assert_eq!(
            workshop("basic", "2026-01-01T00:00:00Z").contract_ref(),
            ContractRef::Basic
        );
        assert_eq!(
            workshop("", "2026-01-01T00:00:00Z").contract_ref(),
            ContractRef::Basic
        );
        assert_eq!(
            workshop("gold", "2026-01-01T00:00:00Z").contract_ref(),
            ContractRef::Id("gold")
        );
    }

    #[test]
    fn test_basic_workshop_premium_only_during_trial() {
        let basic = Contract::basic();
        let w = workshop("basic", "2026-01-01T00:00:00Z");

        let during_trial = Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap();
        let after_trial = Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap();

        assert!(w.is_premium(&basic, during_trial));
        assert!(!w.is_premium(&basic, after_trial));
    }

    #[test]
    fn test_paid_contract_is_premium() {
        let mut gold = Contract::basic();
        gold.id = "gold".to_string();
        let w = workshop("gold", "2020-01-01T00:00:00Z");
        assert!(w.is_premium(&gold, Utc::now()));
    }
}
