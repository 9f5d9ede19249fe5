//! API handlers grouped by resource

pub mod registrations;
pub mod job_cards;
pub mod orders;
pub mod breakdowns;
