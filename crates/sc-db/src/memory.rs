//! In-memory implementation of every store
//!
//! One lock guards all tables, so each trait method is atomic the same way
//! its PostgreSQL counterpart is. Used by tests and by local runs without a
//! database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sc_models::{
    Appointment, Attendance, BreakdownRequest, BreakdownStatus, Customer, Employee, IdCategory,
    IdScope, Invoice, JobCard, JobCardStatus, MechanicAssignment, NewServiceRecord, OrderStatus,
    PartOrder, ServiceRecord, ServiceRecordStatus,
};
use tokio::sync::RwLock;

use crate::breakdowns::{BreakdownChange, BreakdownStore, NewBreakdownRequest};
use crate::customers::CustomerStore;
use crate::job_cards::JobCardStore;
use crate::part_orders::{first_closed_record, OrderDecision, OrderInsert, PartOrderStore};
use crate::repository::{RepositoryError, RepositoryResult};
use crate::sequences::{highest_existing, SequenceStore};
use crate::staff::StaffStore;

#[derive(Debug, Default)]
struct Tables {
    counters: HashMap<String, u64>,
    customers: BTreeMap<String, Customer>,
    appointments: BTreeMap<String, Appointment>,
    employees: BTreeMap<String, Employee>,
    attendance: BTreeMap<(String, NaiveDate), Attendance>,
    job_cards: BTreeMap<String, JobCard>,
    service_records: BTreeMap<i64, ServiceRecord>,
    assignments: Vec<MechanicAssignment>,
    part_orders: BTreeMap<String, PartOrder>,
    breakdowns: BTreeMap<i64, BreakdownRequest>,
    invoices: BTreeMap<String, Invoice>,
    services: HashMap<String, f64>,
    /// Ids of entities this store keeps no table for (suppliers, parts, stock)
    external_ids: Vec<String>,
    next_service_record_id: i64,
    next_breakdown_id: i64,
}

impl Tables {
    fn existing_ids(&self, category: IdCategory) -> Vec<&str> {
        fn keys<V>(map: &BTreeMap<String, V>) -> Vec<&str> {
            map.keys().map(String::as_str).collect()
        }

        match category {
            IdCategory::Customer => keys(&self.customers),
            IdCategory::Appointment => keys(&self.appointments),
            IdCategory::Employee => keys(&self.employees),
            IdCategory::JobCard => keys(&self.job_cards),
            IdCategory::Order => keys(&self.part_orders),
            IdCategory::Invoice => keys(&self.invoices),
            IdCategory::Supplier | IdCategory::Part | IdCategory::Stock => {
                self.external_ids.iter().map(String::as_str).collect()
            }
        }
    }
}

/// All stores backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a service catalog entry
    pub async fn put_service(&self, service_id: impl Into<String>, price: f64) {
        self.tables.write().await.services.insert(service_id.into(), price);
    }

    /// Register identifiers created elsewhere so numbering continues after them
    pub async fn import_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tables = self.tables.write().await;
        tables.external_ids.extend(ids.into_iter().map(Into::into));
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn reserve(&self, scope: &IdScope) -> RepositoryResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        let key = scope.key();

        let last = match tables.counters.get(&key) {
            Some(last) => *last,
            None => highest_existing(scope, tables.existing_ids(scope.id_category())),
        };
        let next = last.saturating_add(1);

        if scope.id_category().cap().is_some_and(|cap| next > cap) {
            tables.counters.insert(key, last);
            return Ok(None);
        }

        tables.counters.insert(key, next);
        Ok(Some(next))
    }
}

fn duplicate(entity: &str, id: &str) -> RepositoryError {
    RepositoryError::Conflict(format!("{entity} {id} already exists"))
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn insert_customer(&self, customer: &Customer) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.customers.contains_key(&customer.id) {
            return Err(duplicate("customer", &customer.id));
        }
        tables.customers.insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn find_customer(&self, id: &str) -> RepositoryResult<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(id).cloned())
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.appointments.contains_key(&appointment.id) {
            return Err(duplicate("appointment", &appointment.id));
        }
        if !tables.customers.contains_key(&appointment.customer_id) {
            return Err(RepositoryError::Conflict(format!(
                "customer {} does not exist",
                appointment.customer_id
            )));
        }
        tables
            .appointments
            .insert(appointment.id.clone(), appointment.clone());
        Ok(())
    }

    async fn find_appointment(&self, id: &str) -> RepositoryResult<Option<Appointment>> {
        Ok(self.tables.read().await.appointments.get(id).cloned())
    }
}

#[async_trait]
impl StaffStore for MemoryStore {
    async fn insert_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.employees.contains_key(&employee.id) {
            return Err(duplicate("employee", &employee.id));
        }
        tables.employees.insert(employee.id.clone(), employee.clone());
        Ok(())
    }

    async fn find_employee(&self, id: &str) -> RepositoryResult<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(id).cloned())
    }

    async fn find_employees(&self, ids: &[String]) -> RepositoryResult<Vec<Employee>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.employees.get(id).cloned())
            .collect())
    }

    async fn attendance_on(&self, ids: &[String], date: NaiveDate) -> RepositoryResult<Vec<Attendance>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.attendance.get(&(id.clone(), date)).cloned())
            .collect())
    }

    async fn record_attendance(&self, attendance: &Attendance) -> RepositoryResult<Attendance> {
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(&attendance.employee_id) {
            return Err(RepositoryError::Conflict(format!(
                "employee {} does not exist",
                attendance.employee_id
            )));
        }
        let key = (attendance.employee_id.clone(), attendance.date);
        let row = tables.attendance.entry(key).or_insert_with(|| Attendance {
            is_working: false,
            ..attendance.clone()
        });
        row.status = attendance.status;
        Ok(row.clone())
    }
}

#[async_trait]
impl JobCardStore for MemoryStore {
    async fn open_job_card(
        &self,
        card: &JobCard,
        records: &[NewServiceRecord],
    ) -> RepositoryResult<Vec<ServiceRecord>> {
        let mut tables = self.tables.write().await;
        if tables.job_cards.contains_key(&card.id) {
            return Err(duplicate("job card", &card.id));
        }

        tables.job_cards.insert(card.id.clone(), card.clone());
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            tables.next_service_record_id += 1;
            let stored = ServiceRecord {
                id: tables.next_service_record_id,
                job_card_id: card.id.clone(),
                vehicle_id: record.vehicle_id.clone(),
                part_id: record.part_id.clone(),
                description: record.description.clone(),
                status: ServiceRecordStatus::NotStarted,
            };
            tables.service_records.insert(stored.id, stored.clone());
            created.push(stored);
        }
        Ok(created)
    }

    async fn find_job_card(&self, id: &str) -> RepositoryResult<Option<JobCard>> {
        Ok(self.tables.read().await.job_cards.get(id).cloned())
    }

    async fn find_service_record(&self, id: i64) -> RepositoryResult<Option<ServiceRecord>> {
        Ok(self.tables.read().await.service_records.get(&id).cloned())
    }

    async fn service_records(&self, job_card_id: &str) -> RepositoryResult<Vec<ServiceRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .service_records
            .values()
            .filter(|record| record.job_card_id == job_card_id)
            .cloned()
            .collect())
    }

    async fn assignments(&self, job_card_id: &str) -> RepositoryResult<Vec<MechanicAssignment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .filter(|a| a.job_card_id == job_card_id)
            .cloned()
            .collect())
    }

    async fn is_assigned(&self, job_card_id: &str, employee_id: &str) -> RepositoryResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .iter()
            .any(|a| a.job_card_id == job_card_id && a.employee_id == employee_id))
    }

    async fn assign_mechanics(
        &self,
        job_card_id: &str,
        employee_ids: &[String],
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<JobCard>> {
        let mut tables = self.tables.write().await;
        if !tables.job_cards.contains_key(job_card_id) {
            return Ok(None);
        }

        let all_present = employee_ids.iter().all(|id| {
            tables
                .attendance
                .get(&(id.clone(), day))
                .is_some_and(Attendance::is_present)
        });
        if !all_present {
            return Err(RepositoryError::Conflict(format!(
                "attendance changed while assigning mechanics to {job_card_id}"
            )));
        }

        for id in employee_ids {
            if let Some(row) = tables.attendance.get_mut(&(id.clone(), day)) {
                row.is_working = true;
            }
            let already = tables
                .assignments
                .iter()
                .any(|a| a.job_card_id == job_card_id && &a.employee_id == id);
            if !already {
                tables.assignments.push(MechanicAssignment {
                    job_card_id: job_card_id.to_string(),
                    employee_id: id.clone(),
                    assigned_at: at,
                });
            }
        }

        let card = tables.job_cards.get_mut(job_card_id).map(|card| {
            card.status = JobCardStatus::Assigned;
            card.updated_at = at;
            card.clone()
        });
        Ok(card)
    }

    async fn set_job_card_status(
        &self,
        id: &str,
        status: JobCardStatus,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<JobCard>> {
        let mut tables = self.tables.write().await;
        Ok(tables.job_cards.get_mut(id).map(|card| {
            card.status = status;
            card.updated_at = at;
            card.clone()
        }))
    }

    async fn set_service_record_status(
        &self,
        id: i64,
        status: ServiceRecordStatus,
    ) -> RepositoryResult<Option<ServiceRecord>> {
        let mut tables = self.tables.write().await;
        Ok(tables.service_records.get_mut(&id).map(|record| {
            record.status = status;
            record.clone()
        }))
    }
}

#[async_trait]
impl PartOrderStore for MemoryStore {
    async fn insert_order(&self, order: &PartOrder) -> RepositoryResult<OrderInsert> {
        let mut tables = self.tables.write().await;
        if tables.part_orders.contains_key(&order.id) {
            return Err(duplicate("part order", &order.id));
        }
        let referenced = order.lines.iter().filter_map(|line| {
            tables
                .service_records
                .get(&line.service_record_id)
                .map(|record| (record.id, record.status))
        });
        if let Some(closed) = first_closed_record(referenced) {
            return Ok(OrderInsert::RecordClosed(closed));
        }
        tables.part_orders.insert(order.id.clone(), order.clone());
        Ok(OrderInsert::Inserted)
    }

    async fn find_order(&self, id: &str) -> RepositoryResult<Option<PartOrder>> {
        Ok(self.tables.read().await.part_orders.get(id).cloned())
    }

    async fn decide_order(
        &self,
        id: &str,
        decision: OrderDecision,
        cashier_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<PartOrder>> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.part_orders.get_mut(id) else {
            return Ok(None);
        };
        if order.status != OrderStatus::Sent {
            return Ok(None);
        }

        order.status = decision.status();
        match decision {
            OrderDecision::Approve => {
                order.approved_by = Some(cashier_id.to_string());
                order.approved_at = Some(at);
            }
            OrderDecision::Reject => {
                order.rejected_by = Some(cashier_id.to_string());
                order.rejected_at = Some(at);
            }
        }
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl BreakdownStore for MemoryStore {
    async fn insert_request(&self, request: &NewBreakdownRequest) -> RepositoryResult<BreakdownRequest> {
        let mut tables = self.tables.write().await;
        tables.next_breakdown_id += 1;
        let stored = BreakdownRequest {
            id: tables.next_breakdown_id,
            customer_id: Some(request.customer_id.clone()),
            driver_id: None,
            location: request.location.clone(),
            description: request.description.clone(),
            status: BreakdownStatus::Pending,
            request_time: request.request_time,
            accepted_time: None,
            completed_time: None,
            cancelled_time: None,
            cancellation_reason: None,
            invoice_id: None,
        };
        tables.breakdowns.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_request(&self, id: i64) -> RepositoryResult<Option<BreakdownRequest>> {
        Ok(self.tables.read().await.breakdowns.get(&id).cloned())
    }

    async fn apply_change(
        &self,
        id: i64,
        expected: BreakdownStatus,
        change: &BreakdownChange,
    ) -> RepositoryResult<Option<BreakdownRequest>> {
        let target = expected
            .apply(change.action())
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let mut tables = self.tables.write().await;
        match tables.breakdowns.get_mut(&id) {
            Some(request) if request.status == expected => {
                change.apply_to(request, target);
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn service_rate(&self, service_id: &str) -> RepositoryResult<Option<f64>> {
        Ok(self.tables.read().await.services.get(service_id).copied())
    }

    async fn record_invoice(
        &self,
        invoice: &Invoice,
        request_id: i64,
    ) -> RepositoryResult<Option<BreakdownRequest>> {
        let mut tables = self.tables.write().await;
        if tables.invoices.contains_key(&invoice.id) {
            return Err(duplicate("invoice", &invoice.id));
        }

        let updated = match tables.breakdowns.get_mut(&request_id) {
            Some(request) if request.status == BreakdownStatus::Completed => {
                request.status = BreakdownStatus::InvoiceGenerated;
                request.invoice_id = Some(invoice.id.clone());
                request.clone()
            }
            _ => return Ok(None),
        };

        tables.invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(Some(updated))
    }

    async fn find_invoice(&self, id: &str) -> RepositoryResult<Option<Invoice>> {
        Ok(self.tables.read().await.invoices.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use chrono::Utc;
    use sc_models::{AttendanceStatus, Role};

    fn scope(category: IdCategory) -> IdScope {
        IdScope::category(category).unwrap()
    }

    #[tokio::test]
    async fn test_reserve_counts_up_from_existing() {
        let store = MemoryStore::new();
        store.import_ids(["SUP-0041", "P-0007"]).await;

        assert_eq!(store.reserve(&scope(IdCategory::Supplier)).await.unwrap(), Some(42));
        assert_eq!(store.reserve(&scope(IdCategory::Supplier)).await.unwrap(), Some(43));
        assert_eq!(store.reserve(&scope(IdCategory::Order)).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_employee_scopes_are_independent() {
        let store = MemoryStore::new();
        let mechanics = IdScope::employee(Role::Mechanic).unwrap();
        let leaders = IdScope::employee(Role::TeamLeader).unwrap();

        assert_eq!(store.reserve(&mechanics).await.unwrap(), Some(1));
        assert_eq!(store.reserve(&mechanics).await.unwrap(), Some(2));
        assert_eq!(store.reserve(&leaders).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_reserve_stops_at_cap() {
        let store = MemoryStore::new();
        store
            .tables
            .write()
            .await
            .counters
            .insert("job_card".into(), 9998);

        assert_eq!(store.reserve(&scope(IdCategory::JobCard)).await.unwrap(), Some(9999));
        assert_eq!(store.reserve(&scope(IdCategory::JobCard)).await.unwrap(), None);
        assert_eq!(store.reserve(&scope(IdCategory::JobCard)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_are_distinct() {
        let store = Arc::new(MemoryStore::new());
        let tasks = (0..50).map(|_| {
            let store = store.clone();
            async move { store.reserve(&scope(IdCategory::Customer)).await }
        });

        let mut values: Vec<u64> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), 50);
    }

    #[tokio::test]
    async fn test_attendance_upsert_keeps_working_flag() {
        let store = MemoryStore::new();
        let day = Utc::now().date_naive();
        store
            .insert_employee(&Employee {
                id: "M-001".into(),
                name: "Kasun".into(),
                email: "kasun@example.com".into(),
                role: Role::Mechanic,
                phone: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let mut row = Attendance {
            employee_id: "M-001".into(),
            date: day,
            status: AttendanceStatus::Present,
            is_working: true,
        };
        let stored = store.record_attendance(&row).await.unwrap();
        assert!(!stored.is_working);

        store
            .tables
            .write()
            .await
            .attendance
            .get_mut(&("M-001".to_string(), day))
            .unwrap()
            .is_working = true;
        row.status = AttendanceStatus::Absent;
        let stored = store.record_attendance(&row).await.unwrap();
        assert_eq!(stored.status, AttendanceStatus::Absent);
        assert!(stored.is_working);
    }

    #[tokio::test]
    async fn test_decide_order_only_once() {
        let store = MemoryStore::new();
        let order = PartOrder {
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
        store.insert_order(&order).await.unwrap();

        let approved = store
            .decide_order("PO-0001", OrderDecision::Approve, "C-001", Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, OrderStatus::Approved);

        let second = store
            .decide_order("PO-0001", OrderDecision::Reject, "C-002", Utc::now())
            .await
            .unwrap();
        assert!(second.is_none());
        let stored = store.find_order("PO-0001").await.unwrap().unwrap();
        assert_eq!(stored.approved_by.as_deref(), Some("C-001"));
        assert!(stored.rejected_by.is_none());
    }

    #[tokio::test]
    async fn test_conditional_breakdown_change() {
        let store = MemoryStore::new();
        let request = store
            .insert_request(&NewBreakdownRequest {
                customer_id: "C-0001".into(),
                location: "Kandy Road".into(),
                description: None,
                request_time: Utc::now(),
            })
            .await
            .unwrap();

        let accept = BreakdownChange::Accept {
            driver_id: "D1".into(),
            at: Utc::now(),
        };
        let first = store
            .apply_change(request.id, BreakdownStatus::Pending, &accept)
            .await
            .unwrap();
        assert_eq!(first.unwrap().driver_id.as_deref(), Some("D1"));

        let second = store
            .apply_change(request.id, BreakdownStatus::Pending, &accept)
            .await
            .unwrap();
        assert!(second.is_none());
    }
}
