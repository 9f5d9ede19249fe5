//! Part order contracts

use std::collections::HashMap;

use sc_core::{ScError, ScResult, ValidationErrors};
use sc_models::{OrderLine, OrderStatus, PartOrder, ServiceRecord};

use crate::base::{Contract, ValidationResult};

/// Lines of a new order against one job card
///
/// `records` holds the service records the lines refer to, as loaded from
/// the store; a referenced id missing from the map does not exist.
pub struct OrderPartsContract<'a> {
    job_card_id: &'a str,
    records: &'a HashMap<i64, ServiceRecord>,
}

impl<'a> OrderPartsContract<'a> {
    pub fn new(job_card_id: &'a str, records: &'a HashMap<i64, ServiceRecord>) -> Self {
        Self {
            job_card_id,
            records,
        }
    }
}

impl Contract<[OrderLine]> for OrderPartsContract<'_> {
    fn validate(&self, lines: &[OrderLine]) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if lines.is_empty() {
            errors.add("parts", "must list at least one part");
        }

        for (index, line) in lines.iter().enumerate() {
            if line.quantity <= 0 {
                errors.add(format!("parts[{index}].quantity"), "must be greater than 0");
            }
            if line.part_id.trim().is_empty() {
                errors.add(format!("parts[{index}].partId"), "can't be blank");
            }

            let key = format!("serviceRecord {}", line.service_record_id);
            match self.records.get(&line.service_record_id) {
                None => errors.add(key, "does not exist"),
                Some(record) if record.job_card_id != self.job_card_id => {
                    errors.add(key, format!("does not belong to job card {}", self.job_card_id))
                }
                Some(record) if !record.status.is_open() => {
                    errors.add(key, format!("is already {}", record.status))
                }
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Approved and rejected orders are final
pub fn check_order_pending(order: &PartOrder) -> ScResult<()> {
    if order.status.is_final() {
        return Err(ScError::invalid_state(
            "PartOrder",
            &order.id,
            order.status,
            "order has already been finalized",
        ));
    }
    debug_assert_eq!(order.status, OrderStatus::Sent);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sc_models::ServiceRecordStatus;

    fn record(id: i64, job_card_id: &str, status: ServiceRecordStatus) -> ServiceRecord {
        ServiceRecord {
            id,
            job_card_id: job_card_id.into(),
            vehicle_id: "CAB-4521".into(),
            part_id: None,
            description: "Replace filter".into(),
            status,
        }
    }

    fn line(service_record_id: i64, quantity: i32) -> OrderLine {
        OrderLine {
            service_record_id,
            part_id: "P-0001".into(),
            quantity,
        }
    }

    #[test]
    fn test_valid_order() {
        let records = HashMap::from([
            (1, record(1, "JC-0001", ServiceRecordStatus::NotStarted)),
            (2, record(2, "JC-0001", ServiceRecordStatus::Ongoing)),
        ]);
        let contract = OrderPartsContract::new("JC-0001", &records);
        assert!(contract.validate(vec![line(1, 2), line(2, 1)].as_slice()).is_ok());
    }

    #[test]
    fn test_invalid_lines_are_listed() {
        let records = HashMap::from([
            (1, record(1, "JC-0001", ServiceRecordStatus::Finished)),
            (2, record(2, "JC-0002", ServiceRecordStatus::Ongoing)),
        ]);
        let contract = OrderPartsContract::new("JC-0001", &records);
        let errors = contract
            .validate(vec![line(1, 1), line(2, 1), line(3, 0)].as_slice())
            .unwrap_err();

        assert!(errors.has_error("serviceRecord 1"));
        assert!(errors.has_error("serviceRecord 2"));
        assert!(errors.has_error("serviceRecord 3"));
        assert!(errors.has_error("parts[2].quantity"));
    }

    #[test]
    fn test_empty_order() {
        let records = HashMap::new();
        let contract = OrderPartsContract::new("JC-0001", &records);
        assert!(contract.validate(Vec::<OrderLine>::new().as_slice()).unwrap_err().has_error("parts"));
    }

    #[test]
    fn test_finalized_order() {
        let mut order = PartOrder {
            id: "PO-0001".into(),
            job_card_id: "JC-0001".into(),
            requested_by: "M-001".into(),
            status: OrderStatus::Sent,
            order_date: Utc::now(),
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            lines: vec![],
        };
        assert!(check_order_pending(&order).is_ok());

        order.status = OrderStatus::Approved;
        let err = check_order_pending(&order).unwrap_err();
        assert_eq!(err.error_code(), "invalid_state");
        assert!(err.to_string().contains("Approved"));
    }
}
