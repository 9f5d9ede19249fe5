//! Fixtures for the PostgreSQL-backed store tests
//!
//! Those tests are `#[ignore]`d. Run them against a scratch database with
//! `DATABASE_URL=postgres://... cargo test -p sc-db -- --ignored`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sc_core::config::AppConfig;
use sc_models::{JobCard, JobCardStatus, NewServiceRecord, ServiceRecord};

use crate::job_cards::{JobCardStore, PgJobCardStore};
use crate::pool::Database;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Connected pool with the schema in place, or `None` without `DATABASE_URL`
pub async fn database() -> Option<Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let mut config = AppConfig::default().database;
    config.url = url;

    let db = Database::connect(&config).await.expect("connect to DATABASE_URL");
    db.ensure_schema().await.expect("create schema");
    Some(db)
}

/// Key that no other test run has used
pub fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-T{}-{n}", Utc::now().timestamp_micros())
}

pub async fn customer(db: &Database) -> String {
    let id = unique("TCUST");
    sqlx::query("INSERT INTO customers (customer_id, name, email) VALUES ($1, 'Test Customer', 'test@example.com')")
        .bind(&id)
        .execute(db.pool())
        .await
        .unwrap();
    id
}

/// Job card with one open service record, opened through the store
pub async fn job_card(db: &Database) -> (JobCard, ServiceRecord) {
    let customer_id = customer(db).await;
    let appointment_id = unique("TAPT");
    sqlx::query(
        "INSERT INTO appointments (appointment_id, customer_id, vehicle_id, scheduled_for) \
         VALUES ($1, $2, 'CAB-4521', NOW())",
    )
    .bind(&appointment_id)
    .bind(&customer_id)
    .execute(db.pool())
    .await
    .unwrap();

    let now = Utc::now();
    let card = JobCard {
        id: unique("TJC"),
        appointment_id,
        status: JobCardStatus::Created,
        created_by: "SA-001".into(),
        created_at: now,
        updated_at: now,
    };
    let records = PgJobCardStore::new(db.pool().clone())
        .open_job_card(
            &card,
            &[NewServiceRecord {
                vehicle_id: "CAB-4521".into(),
                part_id: None,
                description: "Replace brake pads".into(),
            }],
        )
        .await
        .unwrap();

    let record = records.into_iter().next().unwrap();
    (card, record)
}
