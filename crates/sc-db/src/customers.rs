//! Customer and appointment storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sc_models::{Appointment, Customer};
use sqlx::{FromRow, PgPool};

use crate::repository::RepositoryResult;

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert_customer(&self, customer: &Customer) -> RepositoryResult<()>;

    async fn find_customer(&self, id: &str) -> RepositoryResult<Option<Customer>>;

    async fn insert_appointment(&self, appointment: &Appointment) -> RepositoryResult<()>;

    async fn find_appointment(&self, id: &str) -> RepositoryResult<Option<Appointment>>;
}

#[derive(Debug, Clone, FromRow)]
struct CustomerRow {
    customer_id: String,
    name: String,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.customer_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct AppointmentRow {
    appointment_id: String,
    customer_id: String,
    vehicle_id: String,
    scheduled_for: DateTime<Utc>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.appointment_id,
            customer_id: row.customer_id,
            vehicle_id: row.vehicle_id,
            scheduled_for: row.scheduled_for,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn insert_customer(&self, customer: &Customer) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (customer_id, name, email, phone, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_customer(&self, id: &str) -> RepositoryResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT customer_id, name, email, phone, created_at
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments
                (appointment_id, customer_id, vehicle_id, scheduled_for, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.customer_id)
        .bind(&appointment.vehicle_id)
        .bind(appointment.scheduled_for)
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_appointment(&self, id: &str) -> RepositoryResult<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT appointment_id, customer_id, vehicle_id, scheduled_for, notes, created_at
            FROM appointments
            WHERE appointment_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Appointment::from))
    }
}
