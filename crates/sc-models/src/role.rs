//! Roles carried by authenticated principals

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownStatus;

/// Principal role
///
/// Employees carry one of the staff roles; customers authenticate with
/// `Customer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[serde(rename = "Service Advisor")]
    ServiceAdvisor,
    Mechanic,
    #[serde(rename = "Team Leader")]
    TeamLeader,
    Cashier,
    Driver,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::ServiceAdvisor => "Service Advisor",
            Role::Mechanic => "Mechanic",
            Role::TeamLeader => "Team Leader",
            Role::Cashier => "Cashier",
            Role::Driver => "Driver",
            Role::Customer => "Customer",
        }
    }

    /// Prefix used for employee identifiers of this role
    ///
    /// Drivers and customers are not numbered in the employee sequence.
    pub fn employee_prefix(&self) -> Option<&'static str> {
        match self {
            Role::Admin => Some("A"),
            Role::ServiceAdvisor => Some("SA"),
            Role::Mechanic => Some("M"),
            Role::TeamLeader => Some("TL"),
            Role::Cashier => Some("C"),
            Role::Driver | Role::Customer => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Customer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownStatus;

    /// Accepts the display form ("Team Leader") as well as
    /// snake/compact spellings ("team_leader", "teamleader")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "admin" => Ok(Role::Admin),
            "serviceadvisor" => Ok(Role::ServiceAdvisor),
            "mechanic" => Ok(Role::Mechanic),
            "teamleader" => Ok(Role::TeamLeader),
            "cashier" => Ok(Role::Cashier),
            "driver" => Ok(Role::Driver),
            "customer" => Ok(Role::Customer),
            _ => Err(UnknownStatus {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}
