//! Human-readable sequential identifiers
//!
//! Identifiers look like `<prefix>-<zero-padded number>`, e.g. `C-0001`,
//! `M-001`, `PO-10000`. This module only knows how to render and parse them;
//! reserving the next number atomically is the job of the sequence store.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::Role;

const SEPARATOR: char = '-';

/// Entity categories that receive sequential identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdCategory {
    Customer,
    Appointment,
    Employee,
    JobCard,
    Order,
    Supplier,
    Part,
    Stock,
    Invoice,
}

/// How the numeric suffix is padded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Always pad to this width
    Fixed(usize),
    /// Pad to the minimum width, one digit wider once the value no longer fits
    Growing(usize),
    /// Fixed width with a hard upper bound
    Capped { width: usize, max: u64 },
}

impl IdCategory {
    pub const ALL: [IdCategory; 9] = [
        IdCategory::Customer,
        IdCategory::Appointment,
        IdCategory::Employee,
        IdCategory::JobCard,
        IdCategory::Order,
        IdCategory::Supplier,
        IdCategory::Part,
        IdCategory::Stock,
        IdCategory::Invoice,
    ];

    /// Human-readable name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            IdCategory::Customer => "Customer",
            IdCategory::Appointment => "Appointment",
            IdCategory::Employee => "Employee",
            IdCategory::JobCard => "JobCard",
            IdCategory::Order => "Order",
            IdCategory::Supplier => "Supplier",
            IdCategory::Part => "Part",
            IdCategory::Stock => "Stock",
            IdCategory::Invoice => "Invoice",
        }
    }

    /// Fixed prefix; employees take theirs from the role
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            IdCategory::Customer => Some("C"),
            IdCategory::Appointment => Some("A"),
            IdCategory::Employee => None,
            IdCategory::JobCard => Some("JC"),
            IdCategory::Order => Some("PO"),
            IdCategory::Supplier => Some("SUP"),
            IdCategory::Part => Some("P"),
            IdCategory::Stock => Some("STK"),
            IdCategory::Invoice => Some("INV"),
        }
    }

    pub fn padding(&self) -> Padding {
        match self {
            IdCategory::Customer | IdCategory::Appointment | IdCategory::Stock => Padding::Fixed(4),
            IdCategory::Employee => Padding::Fixed(3),
            IdCategory::Order | IdCategory::Supplier | IdCategory::Part | IdCategory::Invoice => {
                Padding::Growing(4)
            }
            IdCategory::JobCard => Padding::Capped {
                width: 4,
                max: 9999,
            },
        }
    }

    /// Highest value the category may ever reach
    pub fn cap(&self) -> Option<u64> {
        match self.padding() {
            Padding::Capped { max, .. } => Some(max),
            _ => None,
        }
    }

    /// Stable snake_case key, also the serde name
    pub fn key(&self) -> &'static str {
        match self {
            IdCategory::Customer => "customer",
            IdCategory::Appointment => "appointment",
            IdCategory::Employee => "employee",
            IdCategory::JobCard => "job_card",
            IdCategory::Order => "order",
            IdCategory::Supplier => "supplier",
            IdCategory::Part => "part",
            IdCategory::Stock => "stock",
            IdCategory::Invoice => "invoice",
        }
    }

    /// Table and column holding identifiers of this category
    pub fn storage(&self) -> (&'static str, &'static str) {
        match self {
            IdCategory::Customer => ("customers", "customer_id"),
            IdCategory::Appointment => ("appointments", "appointment_id"),
            IdCategory::Employee => ("employees", "employee_id"),
            IdCategory::JobCard => ("job_cards", "job_card_id"),
            IdCategory::Order => ("part_orders", "order_id"),
            IdCategory::Supplier => ("suppliers", "supplier_id"),
            IdCategory::Part => ("parts", "part_id"),
            IdCategory::Stock => ("stocks", "stock_id"),
            IdCategory::Invoice => ("invoices", "invoice_id"),
        }
    }
}

impl fmt::Display for IdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier allocation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier space for {category} is exhausted")]
    Exhausted { category: IdCategory },
    #[error("role '{role}' has no employee identifier prefix")]
    InvalidRole { role: String },
    #[error("category {category} needs a role-derived prefix")]
    PrefixRequired { category: IdCategory },
}

impl From<IdentifierError> for sc_core::ScError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::Exhausted { category } => sc_core::ScError::AllocationExhausted {
                category: category.name(),
            },
            IdentifierError::InvalidRole { .. } => {
                sc_core::ScError::invalid_field("role", err.to_string())
            }
            IdentifierError::PrefixRequired { .. } => sc_core::ScError::Internal(err.to_string()),
        }
    }
}

/// A rendered identifier such as `JC-0042`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Numeric suffix; see [`parse_suffix`]
    pub fn number(&self) -> u64 {
        parse_suffix(&self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Numeric part after the separator; anything unparsable counts as 0
pub fn parse_suffix(identifier: &str) -> u64 {
    identifier
        .split_once(SEPARATOR)
        .and_then(|(_, suffix)| suffix.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// A category resolved to a concrete prefix
///
/// Each scope owns an independent numbering sequence. For employees the
/// scope is per role prefix, so `M-001` and `TL-001` coexist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdScope {
    category: IdCategory,
    prefix: &'static str,
}

impl IdScope {
    /// Scope for a category with a fixed prefix
    pub fn category(category: IdCategory) -> Result<Self, IdentifierError> {
        let prefix = category
            .prefix()
            .ok_or(IdentifierError::PrefixRequired { category })?;
        Ok(Self { category, prefix })
    }

    /// Scope for employees of the given role
    pub fn employee(role: Role) -> Result<Self, IdentifierError> {
        let prefix = role.employee_prefix().ok_or_else(|| IdentifierError::InvalidRole {
            role: role.to_string(),
        })?;
        Ok(Self {
            category: IdCategory::Employee,
            prefix,
        })
    }

    pub fn id_category(&self) -> IdCategory {
        self.category
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Counter key, e.g. `job_card` or `employee:TL`
    pub fn key(&self) -> String {
        match self.category {
            IdCategory::Employee => format!("employee:{}", self.prefix),
            _ => self.category.key().to_string(),
        }
    }

    /// SQL `LIKE` pattern matching every identifier of this scope
    pub fn like_pattern(&self) -> String {
        format!("{}{}%", self.prefix, SEPARATOR)
    }

    /// Whether an existing identifier belongs to this scope
    pub fn owns(&self, identifier: &str) -> bool {
        identifier
            .split_once(SEPARATOR)
            .map(|(prefix, _)| prefix == self.prefix)
            .unwrap_or(false)
    }

    /// First identifier handed out in an empty scope
    pub fn seed(&self) -> Identifier {
        self.format(1, self.min_width())
    }

    /// Render `value`, failing if the category cap is exceeded
    pub fn render(&self, value: u64) -> Result<Identifier, IdentifierError> {
        let width = match self.category.padding() {
            Padding::Fixed(width) => width,
            Padding::Growing(min) => {
                if value > max_for_width(min) {
                    min + 1
                } else {
                    min
                }
            }
            Padding::Capped { width, max } => {
                if value > max {
                    return Err(IdentifierError::Exhausted {
                        category: self.category,
                    });
                }
                width
            }
        };
        Ok(self.format(value, width))
    }

    /// Identifier following `last`, or the seed when there is none
    pub fn next_after(&self, last: Option<&str>) -> Result<Identifier, IdentifierError> {
        match last {
            None => Ok(self.seed()),
            Some(last) => self.render(parse_suffix(last).saturating_add(1)),
        }
    }

    fn min_width(&self) -> usize {
        match self.category.padding() {
            Padding::Fixed(width) | Padding::Growing(width) => width,
            Padding::Capped { width, .. } => width,
        }
    }

    fn format(&self, value: u64, width: usize) -> Identifier {
        Identifier(format!(
            "{}{}{:0width$}",
            self.prefix,
            SEPARATOR,
            value,
            width = width
        ))
    }
}

fn max_for_width(width: usize) -> u64 {
    10u64
        .checked_pow(width as u32)
        .map(|v| v - 1)
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(category: IdCategory) -> IdScope {
        IdScope::category(category).unwrap()
    }

    #[test]
    fn test_seed_values() {
        assert_eq!(scope(IdCategory::Customer).seed().as_str(), "C-0001");
        assert_eq!(scope(IdCategory::Appointment).seed().as_str(), "A-0001");
        assert_eq!(scope(IdCategory::JobCard).seed().as_str(), "JC-0001");
        assert_eq!(scope(IdCategory::Order).seed().as_str(), "PO-0001");
        assert_eq!(scope(IdCategory::Supplier).seed().as_str(), "SUP-0001");
        assert_eq!(scope(IdCategory::Part).seed().as_str(), "P-0001");
        assert_eq!(scope(IdCategory::Stock).seed().as_str(), "STK-0001");
        assert_eq!(scope(IdCategory::Invoice).seed().as_str(), "INV-0001");
        assert_eq!(IdScope::employee(Role::Mechanic).unwrap().seed().as_str(), "M-001");
        assert_eq!(IdScope::employee(Role::ServiceAdvisor).unwrap().seed().as_str(), "SA-001");
    }

    #[test]
    fn test_next_keeps_width_under_capacity() {
        let s = scope(IdCategory::Customer);
        assert_eq!(s.next_after(Some("C-0009")).unwrap().as_str(), "C-0010");
        assert_eq!(s.next_after(None).unwrap().as_str(), "C-0001");

        let tl = IdScope::employee(Role::TeamLeader).unwrap();
        assert_eq!(tl.next_after(Some("TL-009")).unwrap().as_str(), "TL-010");
    }

    #[test]
    fn test_growing_width() {
        let s = scope(IdCategory::Order);
        assert_eq!(s.next_after(Some("PO-9998")).unwrap().as_str(), "PO-9999");
        assert_eq!(s.next_after(Some("PO-9999")).unwrap().as_str(), "PO-10000");
        assert_eq!(s.next_after(Some("PO-10000")).unwrap().as_str(), "PO-10001");

        let sup = scope(IdCategory::Supplier);
        assert_eq!(sup.next_after(Some("SUP-9999")).unwrap().as_str(), "SUP-10000");
    }

    #[test]
    fn test_job_card_cap() {
        let s = scope(IdCategory::JobCard);
        assert_eq!(s.next_after(Some("JC-9998")).unwrap().as_str(), "JC-9999");
        assert_eq!(
            s.next_after(Some("JC-9999")),
            Err(IdentifierError::Exhausted {
                category: IdCategory::JobCard
            })
        );
    }

    #[test]
    fn test_unparsable_suffix_counts_as_zero() {
        let s = scope(IdCategory::Customer);
        assert_eq!(parse_suffix("C-abc"), 0);
        assert_eq!(parse_suffix("C"), 0);
        assert_eq!(s.next_after(Some("C-abc")).unwrap().as_str(), "C-0001");
    }

    #[test]
    fn test_driver_has_no_employee_prefix() {
        assert_eq!(
            IdScope::employee(Role::Driver),
            Err(IdentifierError::InvalidRole {
                role: "Driver".to_string()
            })
        );
    }

    #[test]
    fn test_employee_category_requires_role() {
        assert!(IdScope::category(IdCategory::Employee).is_err());
    }

    #[test]
    fn test_scope_keys_and_patterns() {
        assert_eq!(scope(IdCategory::JobCard).key(), "job_card");
        assert_eq!(IdScope::employee(Role::Cashier).unwrap().key(), "employee:C");
        assert_eq!(scope(IdCategory::Supplier).like_pattern(), "SUP-%");

        let m = IdScope::employee(Role::Mechanic).unwrap();
        assert!(m.owns("M-004"));
        assert!(!m.owns("MX-004"));
        assert!(!m.owns("M004"));
    }
}
