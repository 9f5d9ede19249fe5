//! Job card workflow
//!
//! Team leaders open cards up to mechanics who are in today; assigned
//! mechanics then move the card and its service records along.

use std::collections::HashMap;
use std::sync::Arc;

use sc_contracts::job_cards::{
    check_job_card_status, check_membership, check_service_record_status, distinct_employee_ids,
    AssignMechanicsContract, MechanicCandidate, OpenJobCardContract,
};
use sc_contracts::{authorize, permissions, Actor, Contract};
use sc_core::{Clock, ScError, ScResult};
use sc_db::{CustomerStore, JobCardStore, StaffStore};
use sc_models::{
    IdCategory, JobCard, JobCardStatus, MechanicAssignment, NewServiceRecord, ServiceRecord,
};

use crate::identifiers::IdentifierAllocator;

/// A freshly opened card with its records
#[derive(Debug, Clone)]
pub struct OpenedJobCard {
    pub job_card: JobCard,
    pub service_records: Vec<ServiceRecord>,
}

/// Result of an assignment: the card and everyone now on it
#[derive(Debug, Clone)]
pub struct JobCardAssignment {
    pub job_card: JobCard,
    pub mechanics: Vec<MechanicAssignment>,
}

#[derive(Clone)]
pub struct JobCardService {
    job_cards: Arc<dyn JobCardStore>,
    staff: Arc<dyn StaffStore>,
    customers: Arc<dyn CustomerStore>,
    ids: IdentifierAllocator,
    clock: Arc<dyn Clock>,
    strict_transitions: bool,
}

impl JobCardService {
    pub fn new(
        job_cards: Arc<dyn JobCardStore>,
        staff: Arc<dyn StaffStore>,
        customers: Arc<dyn CustomerStore>,
        ids: IdentifierAllocator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            job_cards,
            staff,
            customers,
            ids,
            clock,
            strict_transitions: false,
        }
    }

    /// Only allow forward moves along the status chain
    pub fn with_strict_transitions(mut self, strict: bool) -> Self {
        self.strict_transitions = strict;
        self
    }

    /// Open a card for an appointment with its initial service records
    pub async fn open_job_card(
        &self,
        actor: &dyn Actor,
        appointment_id: &str,
        records: Vec<NewServiceRecord>,
    ) -> ScResult<OpenedJobCard> {
        authorize(actor, permissions::OPEN_JOB_CARD, "open job cards")?;
        OpenJobCardContract.validate(records.as_slice())?;

        if self.customers.find_appointment(appointment_id).await?.is_none() {
            return Err(ScError::not_found("Appointment", appointment_id));
        }

        let id = self.ids.allocate(IdCategory::JobCard).await?;
        let now = self.clock.now();
        let job_card = JobCard {
            id: id.into_string(),
            appointment_id: appointment_id.to_string(),
            status: JobCardStatus::Created,
            created_by: actor.id().to_string(),
            created_at: now,
            updated_at: now,
        };
        let service_records = self.job_cards.open_job_card(&job_card, &records).await?;

        tracing::info!(
            job_card_id = %job_card.id,
            appointment_id = %appointment_id,
            records = service_records.len(),
            "job card opened"
        );
        Ok(OpenedJobCard {
            job_card,
            service_records,
        })
    }

    /// Put mechanics on a card
    ///
    /// Every mechanic must exist and be Present today; one failure rejects
    /// the whole batch before anything is written.
    pub async fn assign_mechanics(
        &self,
        actor: &dyn Actor,
        job_card_id: &str,
        employee_ids: &[String],
    ) -> ScResult<JobCardAssignment> {
        authorize(actor, permissions::ASSIGN_MECHANICS, "assign mechanics")?;
        let employee_ids = distinct_employee_ids(employee_ids)?;

        if self.job_cards.find_job_card(job_card_id).await?.is_none() {
            return Err(ScError::not_found("JobCard", job_card_id));
        }

        let today = self.clock.today();
        let mut employees: HashMap<String, _> = self
            .staff
            .find_employees(&employee_ids)
            .await?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();
        let mut attendance: HashMap<String, _> = self
            .staff
            .attendance_on(&employee_ids, today)
            .await?
            .into_iter()
            .map(|a| (a.employee_id.clone(), a))
            .collect();

        let candidates: Vec<MechanicCandidate> = employee_ids
            .iter()
            .map(|id| MechanicCandidate {
                employee_id: id.clone(),
                employee: employees.remove(id),
                attendance: attendance.remove(id),
            })
            .collect();
        AssignMechanicsContract.validate(candidates.as_slice())?;

        let job_card = self
            .job_cards
            .assign_mechanics(job_card_id, &employee_ids, today, self.clock.now())
            .await?
            .ok_or_else(|| ScError::not_found("JobCard", job_card_id))?;
        let mechanics = self.job_cards.assignments(job_card_id).await?;

        tracing::info!(
            job_card_id = %job_card_id,
            assigned_by = %actor.id(),
            mechanics = ?employee_ids,
            "mechanics assigned"
        );
        Ok(JobCardAssignment {
            job_card,
            mechanics,
        })
    }

    /// Set a card's status; only mechanics on the card may do this
    pub async fn update_job_card_status(
        &self,
        actor: &dyn Actor,
        job_card_id: &str,
        status: &str,
    ) -> ScResult<JobCard> {
        authorize(actor, permissions::UPDATE_WORK_STATUS, "update job card status")?;

        let card = self
            .job_cards
            .find_job_card(job_card_id)
            .await?
            .ok_or_else(|| ScError::not_found("JobCard", job_card_id))?;
        let assigned = self.job_cards.is_assigned(job_card_id, actor.id()).await?;
        check_membership(assigned, actor.id(), job_card_id)?;

        let next = check_job_card_status(&card, status, self.strict_transitions)?;
        let updated = self
            .job_cards
            .set_job_card_status(job_card_id, next, self.clock.now())
            .await?
            .ok_or_else(|| ScError::not_found("JobCard", job_card_id))?;

        tracing::info!(
            job_card_id = %job_card_id,
            from = %card.status,
            to = %updated.status,
            mechanic = %actor.id(),
            "job card status updated"
        );
        Ok(updated)
    }

    /// Set a service record's status; membership is checked on its card
    pub async fn update_service_record_status(
        &self,
        actor: &dyn Actor,
        service_record_id: i64,
        status: &str,
    ) -> ScResult<ServiceRecord> {
        authorize(actor, permissions::UPDATE_WORK_STATUS, "update service record status")?;

        let record = self
            .job_cards
            .find_service_record(service_record_id)
            .await?
            .ok_or_else(|| ScError::not_found("ServiceRecord", service_record_id))?;
        let assigned = self
            .job_cards
            .is_assigned(&record.job_card_id, actor.id())
            .await?;
        check_membership(assigned, actor.id(), &record.job_card_id)?;

        let next = check_service_record_status(&record, status, self.strict_transitions)?;
        let updated = self
            .job_cards
            .set_service_record_status(service_record_id, next)
            .await?
            .ok_or_else(|| ScError::not_found("ServiceRecord", service_record_id))?;

        tracing::info!(
            service_record_id,
            job_card_id = %record.job_card_id,
            from = %record.status,
            to = %updated.status,
            "service record status updated"
        );
        Ok(updated)
    }

    pub async fn find_job_card(&self, job_card_id: &str) -> ScResult<JobCard> {
        self.job_cards
            .find_job_card(job_card_id)
            .await?
            .ok_or_else(|| ScError::not_found("JobCard", job_card_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use sc_db::{JobCardStore, StaffStore};
    use sc_models::{AttendanceStatus, Role, ServiceRecordStatus};

    #[tokio::test]
    async fn test_open_job_card() {
        let fx = Fixture::new().await;
        let appointment = fx.appointment().await;

        let opened = fx
            .services
            .job_cards
            .open_job_card(&fx.advisor, &appointment, vec![fx.record("Oil change")])
            .await
            .unwrap();

        assert_eq!(opened.job_card.id, "JC-0001");
        assert_eq!(opened.job_card.status, JobCardStatus::Created);
        assert_eq!(opened.service_records.len(), 1);
        assert_eq!(opened.service_records[0].status, ServiceRecordStatus::NotStarted);
    }

    #[tokio::test]
    async fn test_open_job_card_unknown_appointment() {
        let fx = Fixture::new().await;
        let err = fx
            .services
            .job_cards
            .open_job_card(&fx.advisor, "A-0404", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ScError::NotFound { entity: "Appointment", .. }));
    }

    #[tokio::test]
    async fn test_assign_present_mechanics() {
        let fx = Fixture::new().await;
        let card = fx.job_card().await;
        let m1 = fx.mechanic(AttendanceStatus::Present).await;
        let m2 = fx.mechanic(AttendanceStatus::Present).await;

        let result = fx
            .services
            .job_cards
            .assign_mechanics(&fx.leader, &card, &[m1.clone(), m2.clone(), m1.clone()])
            .await
            .unwrap();

        assert_eq!(result.job_card.status, JobCardStatus::Assigned);
        assert_eq!(result.mechanics.len(), 2);

        let rows = fx
            .store
            .attendance_on(&[m1.clone(), m2], fx.clock.today())
            .await
            .unwrap();
        assert!(rows.iter().all(|row| row.is_working));
    }

    #[tokio::test]
    async fn test_reassigning_is_a_no_op() {
        let fx = Fixture::new().await;
        let card = fx.job_card().await;
        let m1 = fx.mechanic(AttendanceStatus::Present).await;

        for _ in 0..2 {
            fx.services
                .job_cards
                .assign_mechanics(&fx.leader, &card, &[m1.clone()])
                .await
                .unwrap();
        }
        assert_eq!(fx.store.assignments(&card).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_absent_mechanic_rejects_batch() {
        let fx = Fixture::new().await;
        let card = fx.job_card().await;
        let present = fx.mechanic(AttendanceStatus::Present).await;
        let absent = fx.mechanic(AttendanceStatus::Absent).await;

        let err = fx
            .services
            .job_cards
            .assign_mechanics(&fx.leader, &card, &[present.clone(), absent.clone()])
            .await
            .unwrap_err();

        match err {
            ScError::Validation(errors) => {
                assert!(errors.has_error(&absent));
                assert!(!errors.has_error(&present));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(fx.store.assignments(&card).await.unwrap().is_empty());
        let stored = fx.store.find_job_card(&card).await.unwrap().unwrap();
        assert_eq!(stored.status, JobCardStatus::Created);
    }

    #[tokio::test]
    async fn test_assign_requires_team_leader() {
        let fx = Fixture::new().await;
        let card = fx.job_card().await;
        let m1 = fx.mechanic(AttendanceStatus::Present).await;
        let actor = fx.actor(&m1, Role::Mechanic);

        let err = fx
            .services
            .job_cards
            .assign_mechanics(&actor, &card, &[m1.clone()])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_assign_empty_list() {
        let fx = Fixture::new().await;
        let card = fx.job_card().await;
        let err = fx
            .services
            .job_cards
            .assign_mechanics(&fx.leader, &card, &[])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_status_update_requires_membership() {
        let fx = Fixture::new().await;
        let card = fx.job_card().await;
        let member = fx.mechanic(AttendanceStatus::Present).await;
        let outsider = fx.mechanic(AttendanceStatus::Present).await;
        fx.services
            .job_cards
            .assign_mechanics(&fx.leader, &card, &[member.clone()])
            .await
            .unwrap();

        let err = fx
            .services
            .job_cards
            .update_job_card_status(&fx.actor(&outsider, Role::Mechanic), &card, "Ongoing")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let updated = fx
            .services
            .job_cards
            .update_job_card_status(&fx.actor(&member, Role::Mechanic), &card, "Ongoing")
            .await
            .unwrap();
        assert_eq!(updated.status, JobCardStatus::Ongoing);
    }

    #[tokio::test]
    async fn test_mechanic_cannot_generate_invoice_status() {
        let fx = Fixture::new().await;
        let (card, mechanic) = fx.assigned_job_card().await;

        let err = fx
            .services
            .job_cards
            .update_job_card_status(&mechanic, &card, "Invoice Generated")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);

        let err = fx
            .services
            .job_cards
            .update_job_card_status(&mechanic, &card, "Paused")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_permissive_and_strict_transitions() {
        let fx = Fixture::new().await;
        let (card, mechanic) = fx.assigned_job_card().await;

        // Permissive by default: skipping ahead and back is allowed
        fx.services
            .job_cards
            .update_job_card_status(&mechanic, &card, "Finished")
            .await
            .unwrap();
        fx.services
            .job_cards
            .update_job_card_status(&mechanic, &card, "Created")
            .await
            .unwrap();

        let strict = fx.services.job_cards.clone().with_strict_transitions(true);
        let err = strict
            .update_job_card_status(&mechanic, &card, "Finished")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(strict
            .update_job_card_status(&mechanic, &card, "Assigned")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_service_record_status_accepts_started() {
        let fx = Fixture::new().await;
        let (card, mechanic) = fx.assigned_job_card().await;
        let record = fx.store.service_records(&card).await.unwrap()[0].id;

        let updated = fx
            .services
            .job_cards
            .update_service_record_status(&mechanic, record, "Started")
            .await
            .unwrap();
        assert_eq!(updated.status, ServiceRecordStatus::Ongoing);

        let err = fx
            .services
            .job_cards
            .update_service_record_status(&mechanic, record, "Halfway")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);

        let err = fx
            .services
            .job_cards
            .update_service_record_status(&mechanic, 9_999, "Finished")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
