//! Part order storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sc_models::{OrderLine, OrderStatus, PartOrder, ServiceRecordStatus};
use sqlx::{FromRow, PgPool};

use crate::repository::{decode, RepositoryError, RepositoryResult};

/// Cashier's verdict on a sent order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDecision {
    Approve,
    Reject,
}

impl OrderDecision {
    pub fn status(&self) -> OrderStatus {
        match self {
            OrderDecision::Approve => OrderStatus::Approved,
            OrderDecision::Reject => OrderStatus::Rejected,
        }
    }
}

/// Outcome of storing a new order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderInsert {
    Inserted,
    /// A referenced service record was finished first; nothing was written
    RecordClosed(i64),
}

/// First finished record among the ones an order refers to
pub fn first_closed_record(
    records: impl IntoIterator<Item = (i64, ServiceRecordStatus)>,
) -> Option<i64> {
    records
        .into_iter()
        .filter(|(_, status)| !status.is_open())
        .map(|(id, _)| id)
        .min()
}

#[async_trait]
pub trait PartOrderStore: Send + Sync {
    /// Insert the order with one part row and one service record row per line
    ///
    /// The referenced service records are locked and re-checked in the same
    /// transaction, so a record finished after validation refuses the order.
    async fn insert_order(&self, order: &PartOrder) -> RepositoryResult<OrderInsert>;

    async fn find_order(&self, id: &str) -> RepositoryResult<Option<PartOrder>>;

    /// Settle an order that is still Sent
    ///
    /// Returns `None` when the order is missing or was settled first by
    /// someone else.
    async fn decide_order(
        &self,
        id: &str,
        decision: OrderDecision,
        cashier_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<PartOrder>>;
}

#[derive(Debug, Clone, FromRow)]
struct PartOrderRow {
    order_id: String,
    job_card_id: String,
    requested_by: String,
    status: String,
    order_date: DateTime<Utc>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    rejected_by: Option<String>,
    rejected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
struct OrderLineRow {
    service_record_id: i64,
    part_id: String,
    quantity: i32,
}

impl PartOrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> RepositoryResult<PartOrder> {
        Ok(PartOrder {
            status: decode(self.status.parse::<OrderStatus>())?,
            id: self.order_id,
            job_card_id: self.job_card_id,
            requested_by: self.requested_by,
            order_date: self.order_date,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            rejected_by: self.rejected_by,
            rejected_at: self.rejected_at,
            lines,
        })
    }
}

pub struct PgPartOrderStore {
    pool: PgPool,
}

impl PgPartOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lines(&self, order_id: &str) -> RepositoryResult<Vec<OrderLine>> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT osr.service_record_id, op.part_id, op.quantity
            FROM order_parts op
            JOIN order_service_records osr
              ON osr.order_id = op.order_id AND osr.line_no = op.line_no
            WHERE op.order_id = $1
            ORDER BY op.line_no
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderLine {
                service_record_id: row.service_record_id,
                part_id: row.part_id,
                quantity: row.quantity,
            })
            .collect())
    }
}

#[async_trait]
impl PartOrderStore for PgPartOrderStore {
    async fn insert_order(&self, order: &PartOrder) -> RepositoryResult<OrderInsert> {
        let mut tx = self.pool.begin().await?;

        let record_ids: Vec<i64> = order.lines.iter().map(|line| line.service_record_id).collect();
        let rows = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT service_record_id, status
            FROM service_records
            WHERE service_record_id = ANY($1)
            ORDER BY service_record_id
            FOR UPDATE
            "#,
        )
        .bind(&record_ids)
        .fetch_all(&mut *tx)
        .await?;

        let mut statuses = Vec::with_capacity(rows.len());
        for (id, status) in rows {
            statuses.push((id, decode(status.parse::<ServiceRecordStatus>())?));
        }
        if let Some(closed) = first_closed_record(statuses) {
            tx.rollback().await?;
            return Ok(OrderInsert::RecordClosed(closed));
        }

        sqlx::query(
            r#"
            INSERT INTO part_orders (order_id, job_card_id, requested_by, status, order_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&order.id)
        .bind(&order.job_card_id)
        .bind(&order.requested_by)
        .bind(order.status.as_str())
        .bind(order.order_date)
        .execute(&mut *tx)
        .await?;

        for (index, line) in order.lines.iter().enumerate() {
            let line_no = decode(i32::try_from(index + 1))?;

            sqlx::query(
                "INSERT INTO order_parts (order_id, line_no, part_id, quantity) VALUES ($1, $2, $3, $4)",
            )
            .bind(&order.id)
            .bind(line_no)
            .bind(&line.part_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO order_service_records (order_id, line_no, service_record_id) VALUES ($1, $2, $3)",
            )
            .bind(&order.id)
            .bind(line_no)
            .bind(line.service_record_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(OrderInsert::Inserted)
    }

    async fn find_order(&self, id: &str) -> RepositoryResult<Option<PartOrder>> {
        let row = sqlx::query_as::<_, PartOrderRow>(
            r#"
            SELECT order_id, job_card_id, requested_by, status, order_date,
                   approved_by, approved_at, rejected_by, rejected_at
            FROM part_orders
            WHERE order_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.lines(id).await?;
                row.into_order(lines).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn decide_order(
        &self,
        id: &str,
        decision: OrderDecision,
        cashier_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Option<PartOrder>> {
        let sql = match decision {
            OrderDecision::Approve => {
                "UPDATE part_orders SET status = $2, approved_by = $3, approved_at = $4 \
                 WHERE order_id = $1 AND status = $5"
            }
            OrderDecision::Reject => {
                "UPDATE part_orders SET status = $2, rejected_by = $3, rejected_at = $4 \
                 WHERE order_id = $1 AND status = $5"
            }
        };

        let updated = sqlx::query(sql)
            .bind(id)
            .bind(decision.status().as_str())
            .bind(cashier_id)
            .bind(at)
            .bind(OrderStatus::Sent.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        self.find_order(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("part order {id}")))
            .map(Some)
    }
}
