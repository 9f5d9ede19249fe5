//! # sc-db
//!
//! Database layer for Service Center RS.
//!
//! Each store is a trait with a PostgreSQL implementation over a shared
//! `sqlx` pool and an in-memory implementation ([`MemoryStore`]).
//! Operations that touch several rows run inside one transaction.
//!
//! ## Example
//!
//! ```ignore
//! use sc_db::{Database, PgJobCardStore, JobCardStore};
//!
//! let db = Database::connect(&config.database).await?;
//! let job_cards = PgJobCardStore::new(db.pool().clone());
//! let card = job_cards.find_job_card("JC-0001").await?;
//! ```

pub mod pool;
pub mod repository;
pub mod sequences;
pub mod customers;
pub mod staff;
pub mod job_cards;
pub mod part_orders;
pub mod breakdowns;
pub mod memory;

#[cfg(test)]
mod test_support;

pub use pool::{Database, PoolStats};
pub use repository::{RepositoryError, RepositoryResult};
pub use sequences::{PgSequenceStore, SequenceStore};
pub use customers::{CustomerStore, PgCustomerStore};
pub use staff::{PgStaffStore, StaffStore};
pub use job_cards::{JobCardStore, PgJobCardStore};
pub use part_orders::{first_closed_record, OrderDecision, OrderInsert, PartOrderStore, PgPartOrderStore};
pub use breakdowns::{BreakdownChange, BreakdownStore, NewBreakdownRequest, PgBreakdownStore};
pub use memory::MemoryStore;
