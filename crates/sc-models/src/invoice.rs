//! Breakdown invoices and charge calculation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sc_core::{ScError, ValidationErrors};

/// Round a monetary amount to whole cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Invoice issued by a driver for a completed breakdown (`INV-0001`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub breakdown_request_id: Option<i64>,
    pub distance_km: f64,
    pub rate_per_km: f64,
    pub service_charge: f64,
    pub additional_charges: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
}

/// Charges for one breakdown call-out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakdownCharge {
    pub distance_km: f64,
    pub rate_per_km: f64,
    pub service_charge: f64,
    pub additional_charges: f64,
    pub total: f64,
}

impl BreakdownCharge {
    /// `distance * rate + additional`, rounded to cents
    ///
    /// Distance and additional charges must be finite and non-negative, and
    /// so must the resulting amounts.
    pub fn compute(
        distance_km: f64,
        rate_per_km: f64,
        additional_charges: f64,
    ) -> Result<Self, ScError> {
        let mut errors = ValidationErrors::new();
        if !distance_km.is_finite() || distance_km < 0.0 {
            errors.add("distanceKm", "must be a non-negative number");
        }
        if !additional_charges.is_finite() || additional_charges < 0.0 {
            errors.add("additionalCharges", "must be a non-negative number");
        }
        if !rate_per_km.is_finite() || rate_per_km < 0.0 {
            errors.add_base("configured breakdown rate is not a valid amount");
        }
        errors.into_result()?;

        let service_charge = round_cents(distance_km * rate_per_km);
        let total = round_cents(service_charge + additional_charges);
        let mut errors = ValidationErrors::new();
        if !service_charge.is_finite() || !total.is_finite() {
            errors.add("distanceKm", "is too large to price");
        }
        errors.into_result()?;

        Ok(Self {
            distance_km,
            rate_per_km,
            service_charge,
            additional_charges: round_cents(additional_charges),
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_total() {
        let charge = BreakdownCharge::compute(10.0, 5.0, 20.0).unwrap();
        assert_eq!(charge.service_charge, 50.0);
        assert_eq!(charge.total, 70.0);
    }

    #[test]
    fn test_rounding_to_cents() {
        assert_eq!(round_cents(12.345_6), 12.35);
        let charge = BreakdownCharge::compute(3.333, 1.5, 0.0).unwrap();
        assert_eq!(charge.service_charge, 5.0);
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        let err = BreakdownCharge::compute(-1.0, 5.0, f64::NAN).unwrap_err();
        match err {
            ScError::Validation(errors) => {
                assert!(errors.has_error("distanceKm"));
                assert!(errors.has_error("additionalCharges"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_overflowing_total() {
        let err = BreakdownCharge::compute(1e308, 5.0, 0.0).unwrap_err();
        match err {
            ScError::Validation(errors) => assert!(errors.has_error("distanceKm")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = BreakdownCharge::compute(1e308, 1.0, f64::MAX).unwrap_err();
        assert_eq!(err.status_code(), 422);
    }
}
