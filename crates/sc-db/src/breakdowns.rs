//! Breakdown request, service catalog and invoice storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sc_models::{BreakdownAction, BreakdownRequest, BreakdownStatus, Invoice};
use sqlx::{FromRow, PgPool};

use crate::repository::{decode, RepositoryError, RepositoryResult};

/// A customer's request before it is stored
#[derive(Debug, Clone)]
pub struct NewBreakdownRequest {
    pub customer_id: String,
    pub location: String,
    pub description: Option<String>,
    pub request_time: DateTime<Utc>,
}

/// Field changes accompanying a driver's move on a request
#[derive(Debug, Clone, PartialEq)]
pub enum BreakdownChange {
    Accept { driver_id: String, at: DateTime<Utc> },
    Complete { at: DateTime<Utc> },
    Cancel { reason: String, at: DateTime<Utc> },
}

impl BreakdownChange {
    pub fn action(&self) -> BreakdownAction {
        match self {
            BreakdownChange::Accept { .. } => BreakdownAction::Accept,
            BreakdownChange::Complete { .. } => BreakdownAction::Complete,
            BreakdownChange::Cancel { .. } => BreakdownAction::Cancel,
        }
    }

    /// Apply to an in-memory request whose status already permits it
    pub fn apply_to(&self, request: &mut BreakdownRequest, status: BreakdownStatus) {
        request.status = status;
        match self {
            BreakdownChange::Accept { driver_id, at } => {
                request.driver_id = Some(driver_id.clone());
                request.accepted_time = Some(*at);
            }
            BreakdownChange::Complete { at } => request.completed_time = Some(*at),
            BreakdownChange::Cancel { reason, at } => {
                request.cancellation_reason = Some(reason.clone());
                request.cancelled_time = Some(*at);
            }
        }
    }
}

#[async_trait]
pub trait BreakdownStore: Send + Sync {
    async fn insert_request(&self, request: &NewBreakdownRequest) -> RepositoryResult<BreakdownRequest>;

    async fn find_request(&self, id: i64) -> RepositoryResult<Option<BreakdownRequest>>;

    /// Apply `change` only if the request is still in `expected`
    ///
    /// Returns `None` when the request is missing or its status moved on.
    async fn apply_change(
        &self,
        id: i64,
        expected: BreakdownStatus,
        change: &BreakdownChange,
    ) -> RepositoryResult<Option<BreakdownRequest>>;

    /// Price per kilometre of a service catalog entry
    async fn service_rate(&self, service_id: &str) -> RepositoryResult<Option<f64>>;

    /// Insert the invoice and link it to a Completed request in one
    /// transaction; `None` (and nothing written) if the request is no
    /// longer Completed.
    async fn record_invoice(
        &self,
        invoice: &Invoice,
        request_id: i64,
    ) -> RepositoryResult<Option<BreakdownRequest>>;

    async fn find_invoice(&self, id: &str) -> RepositoryResult<Option<Invoice>>;
}

#[derive(Debug, Clone, FromRow)]
struct BreakdownRow {
    request_id: i64,
    customer_id: Option<String>,
    driver_id: Option<String>,
    location: String,
    description: Option<String>,
    status: String,
    request_time: DateTime<Utc>,
    accepted_time: Option<DateTime<Utc>>,
    completed_time: Option<DateTime<Utc>>,
    cancelled_time: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    invoice_id: Option<String>,
}

impl TryFrom<BreakdownRow> for BreakdownRequest {
    type Error = RepositoryError;

    fn try_from(row: BreakdownRow) -> RepositoryResult<Self> {
        Ok(BreakdownRequest {
            status: decode(row.status.parse::<BreakdownStatus>())?,
            id: row.request_id,
            customer_id: row.customer_id,
            driver_id: row.driver_id,
            location: row.location,
            description: row.description,
            request_time: row.request_time,
            accepted_time: row.accepted_time,
            completed_time: row.completed_time,
            cancelled_time: row.cancelled_time,
            cancellation_reason: row.cancellation_reason,
            invoice_id: row.invoice_id,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct InvoiceRow {
    invoice_id: String,
    breakdown_request_id: Option<i64>,
    distance_km: f64,
    rate_per_km: f64,
    service_charge: f64,
    additional_charges: f64,
    total: f64,
    notes: Option<String>,
    issued_by: String,
    created_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: row.invoice_id,
            breakdown_request_id: row.breakdown_request_id,
            distance_km: row.distance_km,
            rate_per_km: row.rate_per_km,
            service_charge: row.service_charge,
            additional_charges: row.additional_charges,
            total: row.total,
            notes: row.notes,
            issued_by: row.issued_by,
            created_at: row.created_at,
        }
    }
}

const REQUEST_COLUMNS: &str = "request_id, customer_id, driver_id, location, description, status, \
     request_time, accepted_time, completed_time, cancelled_time, cancellation_reason, invoice_id";

pub struct PgBreakdownStore {
    pool: PgPool,
}

impl PgBreakdownStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BreakdownStore for PgBreakdownStore {
    async fn insert_request(&self, request: &NewBreakdownRequest) -> RepositoryResult<BreakdownRequest> {
        let sql = format!(
            "INSERT INTO breakdown_requests (customer_id, location, description, status, request_time) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BreakdownRow>(&sql)
            .bind(&request.customer_id)
            .bind(&request.location)
            .bind(&request.description)
            .bind(BreakdownStatus::Pending.as_str())
            .bind(request.request_time)
            .fetch_one(&self.pool)
            .await?;
        BreakdownRequest::try_from(row)
    }

    async fn find_request(&self, id: i64) -> RepositoryResult<Option<BreakdownRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM breakdown_requests WHERE request_id = $1");
        let row = sqlx::query_as::<_, BreakdownRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BreakdownRequest::try_from).transpose()
    }

    async fn apply_change(
        &self,
        id: i64,
        expected: BreakdownStatus,
        change: &BreakdownChange,
    ) -> RepositoryResult<Option<BreakdownRequest>> {
        let target = decode(expected.apply(change.action()))?;

        let row = match change {
            BreakdownChange::Accept { driver_id, at } => {
                let sql = format!(
                    "UPDATE breakdown_requests SET status = $3, driver_id = $4, accepted_time = $5 \
                     WHERE request_id = $1 AND status = $2 RETURNING {REQUEST_COLUMNS}"
                );
                sqlx::query_as::<_, BreakdownRow>(&sql)
                    .bind(id)
                    .bind(expected.as_str())
                    .bind(target.as_str())
                    .bind(driver_id)
                    .bind(*at)
                    .fetch_optional(&self.pool)
                    .await?
            }
            BreakdownChange::Complete { at } => {
                let sql = format!(
                    "UPDATE breakdown_requests SET status = $3, completed_time = $4 \
                     WHERE request_id = $1 AND status = $2 RETURNING {REQUEST_COLUMNS}"
                );
                sqlx::query_as::<_, BreakdownRow>(&sql)
                    .bind(id)
                    .bind(expected.as_str())
                    .bind(target.as_str())
                    .bind(*at)
                    .fetch_optional(&self.pool)
                    .await?
            }
            BreakdownChange::Cancel { reason, at } => {
                let sql = format!(
                    "UPDATE breakdown_requests SET status = $3, cancellation_reason = $4, cancelled_time = $5 \
                     WHERE request_id = $1 AND status = $2 RETURNING {REQUEST_COLUMNS}"
                );
                sqlx::query_as::<_, BreakdownRow>(&sql)
                    .bind(id)
                    .bind(expected.as_str())
                    .bind(target.as_str())
                    .bind(reason)
                    .bind(*at)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        row.map(BreakdownRequest::try_from).transpose()
    }

    async fn service_rate(&self, service_id: &str) -> RepositoryResult<Option<f64>> {
        let price = sqlx::query_scalar::<_, f64>("SELECT price FROM services WHERE service_id = $1")
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(price)
    }

    async fn record_invoice(
        &self,
        invoice: &Invoice,
        request_id: i64,
    ) -> RepositoryResult<Option<BreakdownRequest>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices
                (invoice_id, breakdown_request_id, distance_km, rate_per_km, service_charge,
                 additional_charges, total, notes, issued_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&invoice.id)
        .bind(request_id)
        .bind(invoice.distance_km)
        .bind(invoice.rate_per_km)
        .bind(invoice.service_charge)
        .bind(invoice.additional_charges)
        .bind(invoice.total)
        .bind(&invoice.notes)
        .bind(&invoice.issued_by)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "UPDATE breakdown_requests SET status = $3, invoice_id = $4 \
             WHERE request_id = $1 AND status = $2 RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BreakdownRow>(&sql)
            .bind(request_id)
            .bind(BreakdownStatus::Completed.as_str())
            .bind(BreakdownStatus::InvoiceGenerated.as_str())
            .bind(&invoice.id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let request = BreakdownRequest::try_from(row)?;
        tx.commit().await?;
        Ok(Some(request))
    }

    async fn find_invoice(&self, id: &str) -> RepositoryResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT invoice_id, breakdown_request_id, distance_km, rate_per_km, service_charge,
                   additional_charges, total, notes, issued_by, created_at
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Invoice::from))
    }
}
