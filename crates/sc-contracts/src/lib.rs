//! # sc-contracts
//!
//! Contracts for Service Center RS.
//!
//! A contract checks who is acting and whether the entities involved are in
//! a state that allows the operation. Contracts never write; services run
//! them before opening a transaction.

pub mod base;
pub mod registrations;
pub mod job_cards;
pub mod part_orders;
pub mod breakdowns;

pub use base::*;
