//! Job card, service record and mechanic assignment storage

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sc_models::{
    AttendanceStatus, JobCard, JobCardStatus, MechanicAssignment, NewServiceRecord, ServiceRecord,
    ServiceRecordStatus,
};
use sqlx::{FromRow, PgPool};

use crate::repository::{decode, RepositoryError, RepositoryResult};

#[async_trait]
pub trait JobCardStore: Send + Sync {
    /// Insert the card and its records atomically; records start Not Started
    async fn open_job_card(
        &self,
        card: &JobCard,
        records: &[NewServiceRecord],
    ) -> RepositoryResult<Vec<ServiceRecord>>;

    async fn find_job_card(&self, id: &str) -> RepositoryResult<Option<JobCard>>;

    async fn find_service_record(&self, id: i64) -> RepositoryResult<Option<ServiceRecord>>;

    async fn service_records(&self, job_card_id: &str) -> RepositoryResult<Vec<ServiceRecord>>;

    async fn assignments(&self, job_card_id: &str) -> RepositoryResult<Vec<MechanicAssignment>>;

    async fn is_assigned(&self, job_card_id: &str, employee_id: &str) -> RepositoryResult<bool>;

    /// In one transaction: add missing assignment rows, flag each mechanic's
    /// attendance for `day` as working, and move the card to Assigned.
    ///
    /// Fails with `Conflict` and writes nothing if any mechanic is no longer
    /// Present on `day`. Returns `None` if the card does not exist.
    async fn assign_mechanics(
        &self,
        job_card_id: &str,
        employee_ids: &[String],
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<JobCard>>;

    async fn set_job_card_status(
        &self,
        id: &str,
        status: JobCardStatus,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<JobCard>>;

    async fn set_service_record_status(
        &self,
        id: i64,
        status: ServiceRecordStatus,
    ) -> RepositoryResult<Option<ServiceRecord>>;
}

#[derive(Debug, Clone, FromRow)]
struct JobCardRow {
    job_card_id: String,
    appointment_id: String,
    status: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobCardRow> for JobCard {
    type Error = RepositoryError;

    fn try_from(row: JobCardRow) -> RepositoryResult<Self> {
        Ok(JobCard {
            status: decode(row.status.parse::<JobCardStatus>())?,
            id: row.job_card_id,
            appointment_id: row.appointment_id,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct ServiceRecordRow {
    service_record_id: i64,
    job_card_id: String,
    vehicle_id: String,
    part_id: Option<String>,
    description: String,
    status: String,
}

impl TryFrom<ServiceRecordRow> for ServiceRecord {
    type Error = RepositoryError;

    fn try_from(row: ServiceRecordRow) -> RepositoryResult<Self> {
        Ok(ServiceRecord {
            status: decode(row.status.parse::<ServiceRecordStatus>())?,
            id: row.service_record_id,
            job_card_id: row.job_card_id,
            vehicle_id: row.vehicle_id,
            part_id: row.part_id,
            description: row.description,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct AssignmentRow {
    job_card_id: String,
    employee_id: String,
    assigned_at: DateTime<Utc>,
}

const JOB_CARD_COLUMNS: &str =
    "job_card_id, appointment_id, status, created_by, created_at, updated_at";
const SERVICE_RECORD_COLUMNS: &str =
    "service_record_id, job_card_id, vehicle_id, part_id, description, status";

pub struct PgJobCardStore {
    pool: PgPool,
}

impl PgJobCardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobCardStore for PgJobCardStore {
    async fn open_job_card(
        &self,
        card: &JobCard,
        records: &[NewServiceRecord],
    ) -> RepositoryResult<Vec<ServiceRecord>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO job_cards
                (job_card_id, appointment_id, status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&card.id)
        .bind(&card.appointment_id)
        .bind(card.status.as_str())
        .bind(&card.created_by)
        .bind(card.created_at)
        .bind(card.updated_at)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "INSERT INTO service_records (job_card_id, vehicle_id, part_id, description, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SERVICE_RECORD_COLUMNS}"
        );
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query_as::<_, ServiceRecordRow>(&sql)
                .bind(&card.id)
                .bind(&record.vehicle_id)
                .bind(&record.part_id)
                .bind(&record.description)
                .bind(ServiceRecordStatus::NotStarted.as_str())
                .fetch_one(&mut *tx)
                .await?;
            created.push(ServiceRecord::try_from(row)?);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_job_card(&self, id: &str) -> RepositoryResult<Option<JobCard>> {
        let sql = format!("SELECT {JOB_CARD_COLUMNS} FROM job_cards WHERE job_card_id = $1");
        let row = sqlx::query_as::<_, JobCardRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobCard::try_from).transpose()
    }

    async fn find_service_record(&self, id: i64) -> RepositoryResult<Option<ServiceRecord>> {
        let sql = format!(
            "SELECT {SERVICE_RECORD_COLUMNS} FROM service_records WHERE service_record_id = $1"
        );
        let row = sqlx::query_as::<_, ServiceRecordRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ServiceRecord::try_from).transpose()
    }

    async fn service_records(&self, job_card_id: &str) -> RepositoryResult<Vec<ServiceRecord>> {
        let sql = format!(
            "SELECT {SERVICE_RECORD_COLUMNS} FROM service_records \
             WHERE job_card_id = $1 ORDER BY service_record_id"
        );
        let rows = sqlx::query_as::<_, ServiceRecordRow>(&sql)
            .bind(job_card_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ServiceRecord::try_from).collect()
    }

    async fn assignments(&self, job_card_id: &str) -> RepositoryResult<Vec<MechanicAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT job_card_id, employee_id, assigned_at
            FROM job_card_mechanics
            WHERE job_card_id = $1
            ORDER BY assigned_at, employee_id
            "#,
        )
        .bind(job_card_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MechanicAssignment {
                job_card_id: row.job_card_id,
                employee_id: row.employee_id,
                assigned_at: row.assigned_at,
            })
            .collect())
    }

    async fn is_assigned(&self, job_card_id: &str, employee_id: &str) -> RepositoryResult<bool> {
        let assigned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM job_card_mechanics WHERE job_card_id = $1 AND employee_id = $2)",
        )
        .bind(job_card_id)
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(assigned)
    }

    async fn assign_mechanics(
        &self,
        job_card_id: &str,
        employee_ids: &[String],
        day: NaiveDate,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<JobCard>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE job_cards SET status = $2, updated_at = $3 WHERE job_card_id = $1 \
             RETURNING {JOB_CARD_COLUMNS}"
        );
        let Some(card) = sqlx::query_as::<_, JobCardRow>(&sql)
            .bind(job_card_id)
            .bind(JobCardStatus::Assigned.as_str())
            .bind(at)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let flagged = sqlx::query(
            r#"
            UPDATE attendance SET is_working = TRUE
            WHERE employee_id = ANY($1) AND attendance_date = $2 AND status = $3
            "#,
        )
        .bind(employee_ids)
        .bind(day)
        .bind(AttendanceStatus::Present.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flagged != employee_ids.len() as u64 {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(format!(
                "attendance changed while assigning mechanics to {job_card_id}"
            )));
        }

        for employee_id in employee_ids {
            sqlx::query(
                r#"
                INSERT INTO job_card_mechanics (job_card_id, employee_id, assigned_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (job_card_id, employee_id) DO NOTHING
                "#,
            )
            .bind(job_card_id)
            .bind(employee_id)
            .bind(at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        JobCard::try_from(card).map(Some)
    }

    async fn set_job_card_status(
        &self,
        id: &str,
        status: JobCardStatus,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<JobCard>> {
        let sql = format!(
            "UPDATE job_cards SET status = $2, updated_at = $3 WHERE job_card_id = $1 \
             RETURNING {JOB_CARD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobCardRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobCard::try_from).transpose()
    }

    async fn set_service_record_status(
        &self,
        id: i64,
        status: ServiceRecordStatus,
    ) -> RepositoryResult<Option<ServiceRecord>> {
        let sql = format!(
            "UPDATE service_records SET status = $2 WHERE service_record_id = $1 \
             RETURNING {SERVICE_RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ServiceRecordRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(ServiceRecord::try_from).transpose()
    }
}
