//! Employee and attendance storage

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sc_models::{Attendance, AttendanceStatus, Employee, Role};
use sqlx::{FromRow, PgPool};

use crate::repository::{decode, RepositoryResult};

#[async_trait]
pub trait StaffStore: Send + Sync {
    async fn insert_employee(&self, employee: &Employee) -> RepositoryResult<()>;

    async fn find_employee(&self, id: &str) -> RepositoryResult<Option<Employee>>;

    /// Employees among `ids`; unknown ids are simply absent from the result
    async fn find_employees(&self, ids: &[String]) -> RepositoryResult<Vec<Employee>>;

    async fn attendance_on(&self, ids: &[String], date: NaiveDate) -> RepositoryResult<Vec<Attendance>>;

    /// Insert or overwrite the status for that day; `is_working` is kept
    async fn record_attendance(&self, attendance: &Attendance) -> RepositoryResult<Attendance>;
}

#[derive(Debug, Clone, FromRow)]
struct EmployeeRow {
    employee_id: String,
    name: String,
    email: String,
    role: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = crate::RepositoryError;

    fn try_from(row: EmployeeRow) -> RepositoryResult<Self> {
        Ok(Employee {
            role: decode(row.role.parse::<Role>())?,
            id: row.employee_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct AttendanceRow {
    employee_id: String,
    attendance_date: NaiveDate,
    status: String,
    is_working: bool,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = crate::RepositoryError;

    fn try_from(row: AttendanceRow) -> RepositoryResult<Self> {
        Ok(Attendance {
            status: decode(row.status.parse::<AttendanceStatus>())?,
            employee_id: row.employee_id,
            date: row.attendance_date,
            is_working: row.is_working,
        })
    }
}

pub struct PgStaffStore {
    pool: PgPool,
}

impl PgStaffStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffStore for PgStaffStore {
    async fn insert_employee(&self, employee: &Employee) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (employee_id, name, email, role, phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.role.as_str())
        .bind(&employee.phone)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_employee(&self, id: &str) -> RepositoryResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT employee_id, name, email, role, phone, created_at
            FROM employees
            WHERE employee_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Employee::try_from).transpose()
    }

    async fn find_employees(&self, ids: &[String]) -> RepositoryResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT employee_id, name, email, role, phone, created_at
            FROM employees
            WHERE employee_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Employee::try_from).collect()
    }

    async fn attendance_on(&self, ids: &[String], date: NaiveDate) -> RepositoryResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT employee_id, attendance_date, status, is_working
            FROM attendance
            WHERE employee_id = ANY($1) AND attendance_date = $2
            "#,
        )
        .bind(ids)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Attendance::try_from).collect()
    }

    async fn record_attendance(&self, attendance: &Attendance) -> RepositoryResult<Attendance> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            INSERT INTO attendance (employee_id, attendance_date, status, is_working)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (employee_id, attendance_date)
            DO UPDATE SET status = EXCLUDED.status
            RETURNING employee_id, attendance_date, status, is_working
            "#,
        )
        .bind(&attendance.employee_id)
        .bind(attendance.date)
        .bind(attendance.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Attendance::try_from(row)
    }
}
